//! Typed wrappers over the transport for individual API resources.

pub mod users;

pub use users::UserService;
