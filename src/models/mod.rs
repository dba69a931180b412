//! Data models shared by the store, the services and the HTTP layer.

pub mod user;

pub use user::*;
