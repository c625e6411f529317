//! Authentication module for managing the session token.
//!
//! This module provides:
//! - `SessionManager`: login/logout/refresh and the derived session state
//! - `TokenSlot`: the single active token, mirrored to durable storage
//! - `TokenStorage`: the storage capability, with memory, file, and
//!   keychain backends
//! - `SessionToken`: expiry decoding for bearer tokens
//! - `RouteGate`: access decisions for protected pages and API routes

pub mod error;
pub mod guard;
pub mod session;
pub mod slot;
pub mod storage;
pub mod token;

pub use error::AuthError;
pub use guard::{GateDecision, RouteGate};
pub use session::{AuthStatus, SessionManager, SessionState};
pub use slot::{TokenSlot, TOKEN_KEY};
pub use storage::{FileStorage, KeyringStorage, MemoryStorage, StorageError, TokenStorage};
pub use token::{SessionToken, TokenError};
