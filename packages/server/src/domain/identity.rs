//! Caller identity.

use super::{AuthError, Password, Timestamp, UserId};

/// Authenticated caller, resolved once per request and threaded into handlers
/// and chat sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
}

impl Identity {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

/// Turns a presented credential (e.g. a bearer token) into an [`Identity`].
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, credential: &str) -> Result<Identity, AuthError>;
}

/// An access token handed out at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Timestamp,
}

/// Mints access tokens that an [`IdentityResolver`] will accept.
pub trait TokenIssuer: Send + Sync {
    fn issue_token(&self, user_id: &UserId) -> Result<AccessToken, AuthError>;
}

/// One-way password hashing. Both calls are CPU bound.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &Password) -> Result<String, AuthError>;

    /// `Ok(false)` for a wrong password, `Err` only for an unreadable hash.
    fn verify(&self, password: &str, password_hash: &str) -> Result<bool, AuthError>;
}
