//! UseCase: ユーザー登録

use std::sync::Arc;

use tsudoi_shared::time::Clock;

use crate::domain::{
    AuthError, CredentialHasher, Email, NewUser, Password, RepositoryError, Timestamp, User,
    UserName, UserRepository,
};

use super::error::UserError;

/// ユーザー登録の入力
#[derive(Debug, Clone)]
pub struct RegisterUserInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// ユーザー登録のユースケース
///
/// パスワードはハッシュにしてから保存する。メールアドレスは一意。
pub struct RegisterUserUseCase {
    repository: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
    clock: Arc<dyn Clock>,
}

impl RegisterUserUseCase {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        hasher: Arc<dyn CredentialHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            hasher,
            clock,
        }
    }

    pub async fn execute(&self, input: RegisterUserInput) -> Result<User, UserError> {
        let name = UserName::new(input.name)?;
        let email = Email::new(input.email)?;
        let password = Password::new(input.password)?;

        // 登録済みならハッシュ計算を省く（最終的な一意性は create が保証する）
        if self.repository.find_by_email(&email).await?.is_some() {
            return Err(RepositoryError::EmailTaken(email).into());
        }

        let hasher = self.hasher.clone();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::HashFailed(e.to_string()))??;

        let user = self
            .repository
            .create(
                NewUser {
                    name,
                    email,
                    password_hash,
                },
                Timestamp::new(self.clock.now_millis()),
            )
            .await?;
        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MockCredentialHasher, MockUserRepository, ValueObjectError},
        infrastructure::repository::InMemoryUserRepository,
    };
    use tsudoi_shared::time::FixedClock;

    fn input(email: &str, password: &str) -> RegisterUserInput {
        RegisterUserInput {
            name: "Alice".to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn stub_hasher() -> MockCredentialHasher {
        let mut hasher = MockCredentialHasher::new();
        hasher
            .expect_hash()
            .returning(|p| Ok(format!("hashed:{}", p.expose().len())));
        hasher
    }

    #[tokio::test]
    async fn test_register_user_stores_hashed_password() {
        // テスト項目: 登録したユーザーには平文ではなくハッシュが保存される
        // given (前提条件):
        let usecase = RegisterUserUseCase::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(stub_hasher()),
            Arc::new(FixedClock::new(1000)),
        );

        // when (操作):
        let user = usecase
            .execute(input("Alice@Example.com", "correct horse"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(user.email.as_str(), "alice@example.com");
        assert_eq!(user.password_hash, "hashed:13");
        assert_eq!(user.created_at, Timestamp::new(1000));
    }

    #[tokio::test]
    async fn test_register_user_with_taken_email_skips_hashing() {
        // テスト項目: 登録済みのメールアドレスはハッシュ計算も保存もせずに拒否される
        // given (前提条件):
        let mut repository = MockUserRepository::new();
        repository.expect_find_by_email().times(1).returning(|email| {
            Ok(Some(User {
                id: crate::domain::UserId::generate(),
                name: UserName::new("Someone".to_string()).unwrap(),
                email: email.clone(),
                password_hash: "x".to_string(),
                created_at: Timestamp::new(1),
            }))
        });
        repository.expect_create().never();
        let mut hasher = MockCredentialHasher::new();
        hasher.expect_hash().never();
        let usecase = RegisterUserUseCase::new(
            Arc::new(repository),
            Arc::new(hasher),
            Arc::new(FixedClock::new(1000)),
        );

        // when (操作):
        let result = usecase
            .execute(input("alice@example.com", "correct horse"))
            .await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(UserError::Repository(RepositoryError::EmailTaken(_)))
        ));
    }

    #[tokio::test]
    async fn test_register_user_rejects_short_password() {
        // テスト項目: 短すぎるパスワードでは登録できない
        // given (前提条件):
        let mut repository = MockUserRepository::new();
        repository.expect_find_by_email().never();
        let usecase = RegisterUserUseCase::new(
            Arc::new(repository),
            Arc::new(stub_hasher()),
            Arc::new(FixedClock::new(1000)),
        );

        // when (操作):
        let result = usecase.execute(input("alice@example.com", "short")).await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(UserError::InvalidInput(ValueObjectError::PasswordTooShort(_)))
        ));
    }
}
