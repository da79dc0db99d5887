//! HS256 JWT による IdentityResolver
//!
//! トークンの `sub` クレームをユーザー ID として扱う。ログイン時のトークン発行も担う。

use std::time::Duration;

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AccessToken, AuthError, Identity, IdentityResolver, Timestamp, TokenIssuer, UserId,
};

/// ログインで発行するトークンの既定の有効期間
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: u64,
    pub iat: u64,
}

pub struct JwtIdentityResolver {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
}

impl JwtIdentityResolver {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }

    /// `TokenIssuer` として発行するトークンの有効期間を変える
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// `ttl` の間有効なトークンを発行する
    pub fn issue(&self, user_id: &UserId, ttl: Duration) -> Result<String, AuthError> {
        self.sign(user_id, ttl).map(|(token, _)| token)
    }

    fn sign(&self, user_id: &UserId, ttl: Duration) -> Result<(String, u64), AuthError> {
        let iat = tsudoi_shared::time::now_millis().max(0) as u64 / 1000;
        let claims = Claims {
            sub: user_id.as_str().to_string(),
            iat,
            exp: iat + ttl.as_secs(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::IssueFailed(e.to_string()))?;
        Ok((token, claims.exp))
    }
}

impl TokenIssuer for JwtIdentityResolver {
    fn issue_token(&self, user_id: &UserId) -> Result<AccessToken, AuthError> {
        let (token, exp) = self.sign(user_id, self.token_ttl)?;
        Ok(AccessToken {
            token,
            expires_at: Timestamp::new(exp as i64 * 1000),
        })
    }
}

impl IdentityResolver for JwtIdentityResolver {
    fn resolve(&self, credential: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(credential, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidCredential(e.to_string()),
            },
        )?;
        let user_id = UserId::new(data.claims.sub)
            .map_err(|e| AuthError::InvalidCredential(e.to_string()))?;
        Ok(Identity::new(user_id))
    }
}
