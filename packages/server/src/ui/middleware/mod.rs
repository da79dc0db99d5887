//! HTTP middleware.

pub mod auth;
pub mod cache;

pub use auth::authenticate;
pub use cache::read_cache;
