use reqwest::Url;
use serde_json::Value;

use crate::api::{ApiClient, RequestOptions, TransportError};
use crate::models::{PaginationParams, UserData, UserPatch};

const USERS_PATH: &str = "/users";

/// Scratch origin used only to encode path segments
const USERS_BASE: &str = "http://users.local/users";

/// `/users` endpoints. Shares the session's token through the client.
#[derive(Clone)]
pub struct UserService {
    client: ApiClient,
}

impl UserService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `/users/<id>` with `id` percent-encoded as a single segment
    fn path(id: &str) -> Result<String, TransportError> {
        if matches!(id, "" | "." | "..") {
            return Err(TransportError::InvalidRequest(format!("invalid user id '{}'", id)));
        }
        let mut url = Url::parse(USERS_BASE).map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidRequest("users base cannot take segments".into()))?
            .push(id);
        Ok(url.path().to_string())
    }

    pub async fn list(&self, params: &PaginationParams) -> Result<Vec<UserData>, TransportError> {
        let options = RequestOptions::with_query(params.query_pairs());
        Ok(self.client.get_with(USERS_PATH, options).await?.into_data())
    }

    pub async fn get(&self, id: &str) -> Result<UserData, TransportError> {
        Ok(self.client.get(&Self::path(id)?).await?.into_data())
    }

    pub async fn create(&self, user: &UserPatch) -> Result<UserData, TransportError> {
        Ok(self.client.post(USERS_PATH, user).await?.into_data())
    }

    pub async fn update(&self, id: &str, user: &UserPatch) -> Result<UserData, TransportError> {
        Ok(self.client.put(&Self::path(id)?, user).await?.into_data())
    }

    pub async fn delete(&self, id: &str) -> Result<(), TransportError> {
        self.client.delete::<Value>(&Self::path(id)?).await?;
        Ok(())
    }
}
