//! The `{ data, message, status }` response envelope.
//!
//! The backend is inconsistent about `status`: some endpoints send the
//! numeric HTTP code, others send `"success"` or `"error"`. Both forms are
//! accepted here and folded into a single success check.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::TransportError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(untagged)]
pub enum EnvelopeStatus {
    Code(u16),
    Text(String),
}

impl EnvelopeStatus {
    /// Whether the status reports success.
    ///
    /// Numeric codes succeed in the 2xx range. Text succeeds for `"success"`
    /// or a 2xx code written as a string (`"200"`).
    pub fn is_success(&self) -> bool {
        match self {
            EnvelopeStatus::Code(code) => (200..300).contains(code),
            EnvelopeStatus::Text(text) => {
                let text = text.trim();
                text.eq_ignore_ascii_case("success")
                    || text.parse::<u16>().map(|c| (200..300).contains(&c)).unwrap_or(false)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T = Value> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EnvelopeStatus>,
}

impl<T> ApiEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.status.as_ref().map(EnvelopeStatus::is_success).unwrap_or(true)
    }

    pub fn into_data(self) -> T {
        self.data
    }
}

/// Loosely parsed response body, before the caller's type is applied.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawEnvelope {
    pub data: Value,
    pub message: Option<String>,
    pub status: Option<EnvelopeStatus>,
}

impl RawEnvelope {
    /// Parse a response body.
    ///
    /// An empty body is JSON `null`. A JSON object with a `data` field is an
    /// envelope; anything else becomes the `data` of a bare envelope. A body
    /// that is not JSON at all is kept as a string so error paths can still
    /// report it.
    pub fn parse(body: &str) -> Self {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Self::bare(Value::Null);
        }

        let value: Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(_) => return Self::bare(Value::String(trimmed.to_string())),
        };

        match value {
            Value::Object(mut map) if map.contains_key("data") => {
                let data = map.remove("data").unwrap_or(Value::Null);
                let message = map
                    .remove("message")
                    .and_then(|m| m.as_str().map(str::to_string));
                let status = map
                    .remove("status")
                    .and_then(|s| serde_json::from_value::<EnvelopeStatus>(s).ok());
                Self { data, message, status }
            }
            Value::Object(map) => {
                // Error bodies often carry only `message` (or `error`). A
                // `status` here may be a resource field, so it is left alone.
                let message = map
                    .get("message")
                    .or_else(|| map.get("error"))
                    .and_then(|m| m.as_str().map(str::to_string));
                Self {
                    data: Value::Object(map),
                    message,
                    status: None,
                }
            }
            other => Self::bare(other),
        }
    }

    fn bare(data: Value) -> Self {
        Self {
            data,
            message: None,
            status: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.as_ref().map(EnvelopeStatus::is_success).unwrap_or(true)
    }

    /// Apply the caller's data type, filling in the HTTP status when the
    /// body did not carry one.
    pub fn decode<T: DeserializeOwned>(self, http_status: u16) -> Result<ApiEnvelope<T>, TransportError> {
        let data = serde_json::from_value::<T>(self.data)
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        Ok(ApiEnvelope {
            data,
            message: self.message,
            status: Some(self.status.unwrap_or(EnvelopeStatus::Code(http_status))),
        })
    }
}
