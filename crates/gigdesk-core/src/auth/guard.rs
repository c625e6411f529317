//! Route gating for the hosting page layer.
//!
//! The gate never renders anything. It turns a path plus the current
//! [`AuthStatus`] into a decision the host acts on.

use serde_json::{json, Value};

use super::AuthStatus;

/// Login entry point unauthenticated page visits are sent to
pub const LOGIN_PATH: &str = "/login";

/// Page routes reachable without a session (prefix match)
const PUBLIC_PAGE_PREFIXES: &[&str] = &["/login", "/register", "/forgot-password", "/reset-password"];

/// API routes reachable without a session (exact match)
const PUBLIC_API_ROUTES: &[&str] = &["/api/auth/login", "/api/auth/register", "/api/auth/forgot-password"];

#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Session state is still resolving; render nothing protected yet
    Loading,
    Allow,
    /// Send the visitor to `location`
    Redirect { location: String },
    /// Answer an API call with `status` and a JSON `body`
    Reject { status: u16, body: Value },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RouteGate;

impl RouteGate {
    pub fn new() -> Self {
        Self
    }

    pub fn is_api_route(path: &str) -> bool {
        path == "/api" || path.starts_with("/api/")
    }

    pub fn is_public(path: &str) -> bool {
        if Self::is_api_route(path) {
            return PUBLIC_API_ROUTES.contains(&path);
        }
        path == "/" || PUBLIC_PAGE_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
    }

    pub fn decide(&self, path: &str, status: AuthStatus) -> GateDecision {
        if Self::is_public(path) {
            return GateDecision::Allow;
        }
        if status.loading {
            return GateDecision::Loading;
        }
        if status.authenticated {
            return GateDecision::Allow;
        }

        if Self::is_api_route(path) {
            return GateDecision::Reject {
                status: 401,
                body: json!({ "message": "Authentication required" }),
            };
        }

        GateDecision::Redirect {
            location: Self::login_location(path),
        }
    }

    /// `/login?from=<path>` with the path form-encoded
    fn login_location(from: &str) -> String {
        let mut url = match reqwest::Url::parse("http://gate.local/login") {
            Ok(url) => url,
            Err(_) => return LOGIN_PATH.to_string(),
        };
        url.query_pairs_mut().append_pair("from", from);
        match url.query() {
            Some(query) => format!("{}?{}", LOGIN_PATH, query),
            None => LOGIN_PATH.to_string(),
        }
    }
}
