use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, TransportError};
use crate::config::ApiConfig;
use crate::models::{LoginCredentials, LoginResponseData};

use super::storage::TokenStorage;
use super::{AuthError, SessionToken, TokenSlot};

/// Refresh this long before the token actually expires
const TOKEN_REFRESH_BUFFER_MINUTES: i64 = 5;

const LOGIN_PATH: &str = "/auth/login";
const LOGOUT_PATH: &str = "/auth/logout";
const REFRESH_PATH: &str = "/auth/refresh";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    Expired,
}

/// What route gating reads before deciding anything
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct AuthStatus {
    pub loading: bool,
    pub authenticated: bool,
}

/// Counts a login or refresh as in flight until dropped, including when
/// the caller abandons the future.
struct Pending<'a>(&'a AtomicUsize);

impl<'a> Pending<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Owns the login/logout/refresh workflows for one token slot.
///
/// Construct once at startup and hand out references; every check of
/// "is authenticated" is recomputed from the stored token.
pub struct SessionManager {
    client: ApiClient,
    pending: AtomicUsize,
}

impl SessionManager {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            pending: AtomicUsize::new(0),
        }
    }

    /// Rehydrate the token from `storage` and build the client around it
    pub fn connect(config: ApiConfig, storage: Arc<dyn TokenStorage>) -> Result<Self, TransportError> {
        let slot = Arc::new(TokenSlot::load(storage));
        Ok(Self::new(ApiClient::new(config, slot)?))
    }

    /// Transport client sharing this session's token
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    fn slot(&self) -> &TokenSlot {
        self.client.token_slot()
    }

    /// The stored token, if it decodes
    pub fn token(&self) -> Option<SessionToken> {
        let raw = self.slot().get()?;
        match SessionToken::parse(&raw) {
            Ok(token) => Some(token),
            Err(e) => {
                debug!(error = %e, "Stored token does not decode");
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(Utc::now())
    }

    pub fn is_authenticated_at(&self, now: DateTime<Utc>) -> bool {
        self.token().map(|t| !t.is_expired_at(now)).unwrap_or(false)
    }

    pub fn state(&self) -> SessionState {
        self.state_at(Utc::now())
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> SessionState {
        if self.pending.load(Ordering::SeqCst) > 0 {
            return SessionState::Authenticating;
        }
        match self.token() {
            None => SessionState::Unauthenticated,
            Some(t) if t.is_expired_at(now) => SessionState::Expired,
            Some(_) => SessionState::Authenticated,
        }
    }

    pub fn status(&self) -> AuthStatus {
        AuthStatus {
            loading: self.pending.load(Ordering::SeqCst) > 0,
            authenticated: self.is_authenticated(),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionToken, AuthError> {
        let credentials = LoginCredentials::new(email, password);
        credentials.validate()?;

        let _pending = Pending::enter(&self.pending);
        debug!(email = %credentials.email, "Logging in");

        let result = match self.client.post::<LoginResponseData, _>(LOGIN_PATH, &credentials).await {
            Ok(response) => self.accept(response.data),
            Err(e) => {
                warn!(error = %e, status = ?e.status(), "Login failed");
                Err(AuthError::from_login(e))
            }
        };

        match result {
            Ok(token) => {
                info!(expires_at = %token.expires_at(), "Login succeeded");
                Ok(token)
            }
            Err(e) => {
                // A failed attempt never leaves an earlier session behind
                if !self.slot().is_empty() {
                    debug!("Clearing previous session after failed login");
                    self.slot().clear();
                }
                Err(e)
            }
        }
    }

    /// End the session. Always leaves the local token cleared; a failed
    /// remote logout is only logged.
    pub async fn logout(&self) {
        if self.slot().is_empty() {
            debug!("Logout with no stored token");
            return;
        }

        if self.is_authenticated() {
            if let Err(e) = self.client.post::<Value, _>(LOGOUT_PATH, &json!({})).await {
                warn!(error = %e, "Remote logout failed, clearing local session anyway");
            }
        } else {
            debug!("Stored token already expired, skipping remote logout");
        }

        self.slot().clear();
        info!("Logged out");
    }

    /// Exchange the current token for a new one. Any failure ends the session.
    pub async fn refresh_token(&self) -> Result<SessionToken, AuthError> {
        if self.slot().is_empty() {
            return Err(AuthError::NotAuthenticated);
        }

        let _pending = Pending::enter(&self.pending);
        let result = match self.client.post::<LoginResponseData, _>(REFRESH_PATH, &json!({})).await {
            Ok(response) => self.accept(response.data),
            Err(e) => Err(AuthError::from_refresh(e)),
        };

        match result {
            Ok(token) => {
                info!(expires_at = %token.expires_at(), "Token refreshed");
                Ok(token)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, ending session");
                self.slot().clear();
                Err(e)
            }
        }
    }

    /// Refresh if the token expires within the buffer window
    pub async fn ensure_fresh(&self) -> Result<SessionToken, AuthError> {
        let Some(token) = self.token() else {
            return Err(AuthError::NotAuthenticated);
        };
        if token.expires_within(Utc::now(), Duration::minutes(TOKEN_REFRESH_BUFFER_MINUTES)) {
            debug!(minutes_left = token.minutes_until_expiry(Utc::now()), "Token expiring soon");
            return self.refresh_token().await;
        }
        Ok(token)
    }

    /// Validate and persist a token from a login or refresh response
    fn accept(&self, data: LoginResponseData) -> Result<SessionToken, AuthError> {
        let raw = data
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::InvalidToken("response carried no token".into()))?;

        let token = SessionToken::parse(&raw).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        if token.is_expired_at(Utc::now()) {
            return Err(AuthError::InvalidToken("token is already expired".into()));
        }

        self.slot().set(token.as_str())?;
        Ok(token)
    }
}
