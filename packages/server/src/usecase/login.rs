//! UseCase: ログイン（アクセストークンの発行）

use std::sync::Arc;

use crate::domain::{AccessToken, AuthError, CredentialHasher, Email, TokenIssuer, UserRepository};

use super::error::UserError;

pub struct LoginUseCase {
    repository: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
    issuer: Arc<dyn TokenIssuer>,
}

impl LoginUseCase {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        hasher: Arc<dyn CredentialHasher>,
        issuer: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            repository,
            hasher,
            issuer,
        }
    }

    /// メールアドレスとパスワードを照合してトークンを発行する
    ///
    /// 未登録のアドレスも、パスワード違いも `UserError::InvalidLogin` になる。
    pub async fn execute(
        &self,
        email: String,
        password: String,
    ) -> Result<AccessToken, UserError> {
        let Ok(email) = Email::new(email) else {
            return Err(UserError::InvalidLogin);
        };
        let Some(user) = self.repository.find_by_email(&email).await? else {
            tracing::info!(email = %email, "login for unknown email");
            return Err(UserError::InvalidLogin);
        };

        let hasher = self.hasher.clone();
        let password_hash = user.password_hash.clone();
        let matched =
            tokio::task::spawn_blocking(move || hasher.verify(&password, &password_hash))
                .await
                .map_err(|e| AuthError::HashFailed(e.to_string()))??;
        if !matched {
            tracing::info!(user_id = %user.id, "login with wrong password");
            return Err(UserError::InvalidLogin);
        }

        let token = self.issuer.issue_token(&user.id)?;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok(token)
    }
}
