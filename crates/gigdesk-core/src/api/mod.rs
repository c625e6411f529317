//! REST transport for the marketplace API.
//!
//! This module provides the `ApiClient` for issuing requests against the
//! configured base URL. It attaches the session's bearer token, enforces
//! the request timeout, and folds every response into either an
//! `ApiEnvelope` or a `TransportError`.
//!
//! A 401 from any endpoint ends the session: the stored token is cleared
//! before the error is returned.

pub mod client;
pub mod envelope;
pub mod error;

pub use client::{ApiClient, RequestOptions};
pub use envelope::{ApiEnvelope, EnvelopeStatus};
pub use error::TransportError;
