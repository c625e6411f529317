use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Unauthorized - session has ended")]
    Unauthorized,

    #[error("{message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl TransportError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Build the error for a non-2xx status other than 401.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        let message = match message {
            Some(m) if !m.trim().is_empty() => Self::truncate_body(&m),
            _ => format!("Request failed with status {}", status),
        };
        TransportError::ApiError { status, message }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Unauthorized => Some(401),
            TransportError::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::NetworkError {
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_uses_message() {
        let err = TransportError::from_status(404, Some("Job not found".into()));
        assert_eq!(
            err,
            TransportError::ApiError {
                status: 404,
                message: "Job not found".into()
            }
        );
        assert_eq!(err.to_string(), "Job not found");
    }

    #[test]
    fn test_from_status_generic_fallback() {
        let err = TransportError::from_status(503, None);
        assert_eq!(err.to_string(), "Request failed with status 503");

        let blank = TransportError::from_status(500, Some("  ".into()));
        assert_eq!(blank.to_string(), "Request failed with status 500");
    }

    #[test]
    fn test_truncate_body() {
        let short = "short body";
        assert_eq!(TransportError::truncate_body(short), short);

        let long = "x".repeat(600);
        let truncated = TransportError::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(500)));
        assert!(truncated.ends_with("(truncated, 600 total bytes)"));

        // Multi-byte characters straddling the cut must not panic
        let accented = "é".repeat(300);
        let truncated = TransportError::truncate_body(&accented);
        assert!(truncated.contains("truncated, 600 total bytes"));
    }

    #[test]
    fn test_status() {
        assert_eq!(TransportError::Unauthorized.status(), Some(401));
        assert_eq!(TransportError::from_status(422, None).status(), Some(422));
        assert_eq!(TransportError::Timeout.status(), None);
    }
}
