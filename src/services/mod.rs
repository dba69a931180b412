//! Business logic.

pub mod auth;

pub use auth::AuthService;
