//! HTTP request handlers.

pub mod http;
pub mod me;

pub use http::*;
pub use me::*;
