use thiserror::Error;

use crate::api::TransportError;
use crate::models::CredentialsError;

use super::storage::StorageError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    NetworkError(#[source] TransportError),

    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Failed to save authentication token: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Map a transport failure from the login endpoint
    pub(crate) fn from_login(err: TransportError) -> Self {
        match err {
            TransportError::Unauthorized => AuthError::InvalidCredentials,
            TransportError::ApiError { status: 422, message } => AuthError::ValidationError(message),
            other => AuthError::NetworkError(other),
        }
    }

    /// Map a transport failure from the refresh endpoint
    pub(crate) fn from_refresh(err: TransportError) -> Self {
        match err {
            TransportError::Unauthorized => AuthError::NotAuthenticated,
            other => AuthError::NetworkError(other),
        }
    }
}

impl From<CredentialsError> for AuthError {
    fn from(err: CredentialsError) -> Self {
        AuthError::ValidationError(err.to_string())
    }
}
