use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct UserData {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

/// Partial user record for create/update; unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
}

impl PaginationParams {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn sorted_by(mut self, sort: &str, order: SortOrder) -> Self {
        self.sort = Some(sort.to_string());
        self.order = Some(order);
        self
    }

    /// Query pairs for the fields that are set, in a stable order
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(ref sort) = self.sort {
            pairs.push(("sort".to_string(), sort.clone()));
        }
        if let Some(order) = self.order {
            pairs.push(("order".to_string(), order.as_str().to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pagination_has_no_pairs() {
        assert!(PaginationParams::default().query_pairs().is_empty());
    }

    #[test]
    fn test_pagination_pairs_skip_unset_fields() {
        let params = PaginationParams {
            page: Some(2),
            order: Some(SortOrder::Desc),
            ..PaginationParams::default()
        };
        assert_eq!(
            params.query_pairs(),
            vec![
                ("page".to_string(), "2".to_string()),
                ("order".to_string(), "desc".to_string()),
            ]
        );

        let full = PaginationParams::page(1, 20).sorted_by("name", SortOrder::Asc);
        assert_eq!(full.query_pairs().len(), 4);
    }

    #[test]
    fn test_user_patch_omits_unset_fields() {
        let patch = UserPatch {
            name: Some("Rina".into()),
            ..UserPatch::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({ "name": "Rina" })
        );
    }
}
