//! 認証

pub mod jwt;
pub mod password;

pub use jwt::{Claims, DEFAULT_TOKEN_TTL, JwtIdentityResolver};
pub use password::Argon2CredentialHasher;
