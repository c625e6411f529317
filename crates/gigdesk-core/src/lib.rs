//! gigdesk core - session and transport client for the gigdesk
//! freelance-marketplace API.
//!
//! A host application builds one [`SessionManager`] at startup from an
//! [`ApiConfig`] and a [`TokenStorage`] backend, then shares it with
//! whatever needs to issue requests or gate routes.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod services;

#[cfg(test)]
mod test_support;

pub use api::{ApiClient, ApiEnvelope, EnvelopeStatus, RequestOptions, TransportError};
pub use auth::{
    AuthError, AuthStatus, FileStorage, GateDecision, KeyringStorage, MemoryStorage, RouteGate,
    SessionManager, SessionState, SessionToken, StorageError, TokenSlot, TokenStorage,
};
pub use config::{ApiConfig, Config};
pub use services::UserService;
