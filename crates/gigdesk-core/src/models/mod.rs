//! Wire models shared with the marketplace API.
//!
//! - `LoginCredentials`, `LoginResponseData`: the login/refresh exchange
//! - `UserData`, `UserPatch`: user records and partial updates
//! - `PaginationParams`, `SortOrder`: list query parameters

pub mod auth;
pub mod user;

pub use auth::{CredentialsError, LoginCredentials, LoginResponseData};
pub use user::{PaginationParams, SortOrder, UserData, UserPatch};
