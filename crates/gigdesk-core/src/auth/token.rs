use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use thiserror::Error;

/// base64url, with or without trailing `=`
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is not a well-formed claims token: {0}")]
    Malformed(String),

    #[error("token expiry is out of range")]
    InvalidExpiry,
}

/// A bearer token together with its decoded expiry.
///
/// Only the claims payload (the second dot-separated segment) is read. The
/// header and signature belong to the server and are never inspected here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    raw: String,
    subject: Option<String>,
    expires_at: DateTime<Utc>,
}

impl SessionToken {
    pub fn parse(raw: &str) -> Result<Self, TokenError> {
        let payload = raw
            .split('.')
            .nth(1)
            .ok_or_else(|| TokenError::Malformed("missing claims segment".into()))?;

        let bytes = PAYLOAD_ENGINE
            .decode(payload)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;
        let claims: Value = serde_json::from_slice(&bytes).map_err(|e| TokenError::Malformed(e.to_string()))?;

        // `exp` is seconds since the epoch and may carry a fraction
        let exp = claims
            .get("exp")
            .and_then(Value::as_f64)
            .ok_or_else(|| TokenError::Malformed("missing numeric exp claim".into()))?;
        if !exp.is_finite() {
            return Err(TokenError::InvalidExpiry);
        }
        let expires_at =
            DateTime::<Utc>::from_timestamp_millis((exp * 1000.0).floor() as i64).ok_or(TokenError::InvalidExpiry)?;

        Ok(Self {
            raw: raw.to_string(),
            subject: claims.get("sub").and_then(Value::as_str).map(str::to_string),
            expires_at,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Check if the token will expire within `window` and should be refreshed
    pub fn expires_within(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.expires_at - window <= now
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_minutes().max(0)
    }
}

#[cfg(test)]
pub(crate) mod test_tokens {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    /// Mint a signed token expiring `ttl` from now
    pub fn token_expiring_in(ttl: Duration) -> String {
        token_with_exp((Utc::now() + ttl).timestamp())
    }

    pub fn token_with_exp(exp: i64) -> String {
        let claims = json!({ "sub": "user-1", "exp": exp });
        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(b"server-secret"))
            .expect("encode test token")
    }

    pub fn fresh_token() -> String {
        token_expiring_in(Duration::hours(1))
    }

    pub fn expired_token() -> String {
        token_expiring_in(Duration::hours(-1))
    }
}

#[cfg(test)]
mod tests {
    use super::test_tokens::*;
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    #[test]
    fn test_parse_reads_expiry_and_subject() {
        let raw = token_with_exp(1_900_000_000);
        let token = SessionToken::parse(&raw).unwrap();
        assert_eq!(token.expires_at().timestamp(), 1_900_000_000);
        assert_eq!(token.subject(), Some("user-1"));
        assert_eq!(token.as_str(), raw);
    }

    #[test]
    fn test_expiry_checks() {
        let now = Utc::now();
        let fresh = SessionToken::parse(&fresh_token()).unwrap();
        assert!(!fresh.is_expired_at(now));
        assert!(fresh.minutes_until_expiry(now) >= 59);
        assert!(!fresh.expires_within(now, Duration::minutes(5)));
        assert!(fresh.expires_within(now, Duration::minutes(90)));

        let stale = SessionToken::parse(&expired_token()).unwrap();
        assert!(stale.is_expired_at(now));
        assert_eq!(stale.minutes_until_expiry(now), 0);
    }

    #[test]
    fn test_signature_is_not_checked() {
        // Signed with a key this client never sees
        let raw = jsonwebtoken::encode(
            &Header::default(),
            &json!({ "exp": 1_900_000_000 }),
            &EncodingKey::from_secret(b"some other key"),
        )
        .unwrap();
        assert!(SessionToken::parse(&raw).is_ok());
    }

    #[test]
    fn test_rejects_malformed_tokens() {
        assert!(matches!(SessionToken::parse(""), Err(TokenError::Malformed(_))));
        assert!(matches!(SessionToken::parse("T1"), Err(TokenError::Malformed(_))));
        assert!(matches!(
            SessionToken::parse("aaa.bbb.ccc"),
            Err(TokenError::Malformed(_))
        ));
    }

    /// Assemble a token from raw header and claims JSON, no padding
    fn unsigned(header: &str, claims: &str) -> String {
        format!(
            "{}.{}.sig",
            PAYLOAD_ENGINE.encode(header).trim_end_matches('='),
            PAYLOAD_ENGINE.encode(claims).trim_end_matches('=')
        )
    }

    #[test]
    fn test_header_algorithm_is_ignored() {
        for header in [
            r#"{"alg":"none","typ":"JWT"}"#,
            r#"{"alg":"ES512"}"#,
            r#"{"typ":"JWT"}"#,
            "not json at all",
        ] {
            let token = SessionToken::parse(&unsigned(header, r#"{"exp":1900000000}"#))
                .unwrap_or_else(|e| panic!("{header}: {e}"));
            assert_eq!(token.expires_at().timestamp(), 1_900_000_000);
        }
    }

    #[test]
    fn test_fractional_exp() {
        let token = SessionToken::parse(&unsigned("{}", r#"{"exp":1900000000.5,"sub":"u-9"}"#)).unwrap();
        assert_eq!(token.expires_at().timestamp(), 1_900_000_000);
        assert_eq!(token.expires_at().timestamp_subsec_millis(), 500);
        assert_eq!(token.subject(), Some("u-9"));
    }

    #[test]
    fn test_padded_and_two_segment_tokens() {
        // 19 bytes of claims encode with trailing padding
        let claims = r#"{"exp":1900000000 }"#;
        let padded = PAYLOAD_ENGINE.encode(claims);
        assert!(padded.ends_with('='));

        let with_padding = format!("h.{}.s", padded);
        assert_eq!(SessionToken::parse(&with_padding).unwrap().expires_at().timestamp(), 1_900_000_000);

        let two_segments = format!("h.{}", padded.trim_end_matches('='));
        assert_eq!(SessionToken::parse(&two_segments).unwrap().expires_at().timestamp(), 1_900_000_000);
    }

    #[test]
    fn test_rejects_unusable_exp() {
        for claims in [r#"{"exp":"1900000000"}"#, r#"{"exp":null}"#, r#"[1900000000]"#] {
            assert!(
                matches!(SessionToken::parse(&unsigned("{}", claims)), Err(TokenError::Malformed(_))),
                "{claims}"
            );
        }
        assert_eq!(
            SessionToken::parse(&unsigned("{}", r#"{"exp":1e300}"#)),
            Err(TokenError::InvalidExpiry)
        );
    }

    #[test]
    fn test_rejects_token_without_exp() {
        let raw = jsonwebtoken::encode(
            &Header::default(),
            &json!({ "sub": "user-1" }),
            &EncodingKey::from_secret(b"k"),
        )
        .unwrap();
        assert!(matches!(SessionToken::parse(&raw), Err(TokenError::Malformed(_))));
    }
}
