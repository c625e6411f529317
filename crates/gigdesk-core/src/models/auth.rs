use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("Email is required")]
    MissingEmail,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Password is required")]
    MissingPassword,
}

/// Login payload. Never persisted.
#[derive(Clone, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl LoginCredentials {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.trim().to_string(),
            password: password.to_string(),
        }
    }

    /// Cheap client-side checks before anything goes over the wire
    pub fn validate(&self) -> Result<(), CredentialsError> {
        if self.email.is_empty() {
            return Err(CredentialsError::MissingEmail);
        }
        if !Self::is_plausible_email(&self.email) {
            return Err(CredentialsError::InvalidEmail);
        }
        if self.password.is_empty() {
            return Err(CredentialsError::MissingPassword);
        }
        Ok(())
    }

    fn is_plausible_email(email: &str) -> bool {
        let mut parts = email.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return false;
        };
        !local.is_empty()
            && !email.chars().any(char::is_whitespace)
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
    }
}

/// `data` of a login or refresh response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct LoginResponseData {
    #[serde(default)]
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_plain_credentials() {
        assert!(LoginCredentials::new("user@x.com", "secret").validate().is_ok());
        // Surrounding whitespace in the email is trimmed
        assert!(LoginCredentials::new("  user@x.com ", "secret").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_email() {
        let cases = ["user", "@x.com", "user@", "user@x", "user@.com", "user@x.", "a@b@c.com", "us er@x.com"];
        for email in cases {
            assert_eq!(
                LoginCredentials::new(email, "secret").validate(),
                Err(CredentialsError::InvalidEmail),
                "{email}"
            );
        }
        assert_eq!(
            LoginCredentials::new("", "secret").validate(),
            Err(CredentialsError::MissingEmail)
        );
    }

    #[test]
    fn test_validate_requires_password() {
        assert_eq!(
            LoginCredentials::new("user@x.com", "").validate(),
            Err(CredentialsError::MissingPassword)
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = LoginCredentials::new("user@x.com", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("user@x.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_serializes_as_wire_payload() {
        let json = serde_json::to_value(LoginCredentials::new("user@x.com", "secret")).unwrap();
        assert_eq!(json, serde_json::json!({ "email": "user@x.com", "password": "secret" }));
    }

    #[test]
    fn test_login_response_token_optional() {
        let data: LoginResponseData = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        assert_eq!(data.token.as_deref(), Some("abc"));
        let data: LoginResponseData = serde_json::from_str("{}").unwrap();
        assert!(data.token.is_none());
    }
}
