//! InMemory User Repository 実装
//!
//! メールアドレスをキーにした `HashMap`。一意性の確認と登録を同じロックの中で行う。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Email, NewUser, RepositoryError, Timestamp, User, UserId, UserRepository};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<Email, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser, created_at: Timestamp) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().await;
        if users.contains_key(&user.email) {
            return Err(RepositoryError::EmailTaken(user.email));
        }
        let user = User {
            id: UserId::generate(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at,
        };
        users.insert(user.email.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let users = self.users.lock().await;
        Ok(users.get(email).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserName;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: UserName::new("Alice".to_string()).unwrap(),
            email: Email::new(email.to_string()).unwrap(),
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    #[tokio::test]
    async fn test_registered_user_is_found_by_email() {
        // テスト項目: 登録したユーザーを正規化済みのメールアドレスで引ける
        // given (前提条件):
        let repo = InMemoryUserRepository::new();
        let created = repo
            .create(new_user("Alice@Example.com"), Timestamp::new(10))
            .await
            .unwrap();

        // when (操作):
        let found = repo
            .find_by_email(&Email::new("alice@example.com".to_string()).unwrap())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        // テスト項目: 同じメールアドレスでは 2 人目を登録できない
        // given (前提条件):
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("alice@example.com"), Timestamp::new(10))
            .await
            .unwrap();

        // when (操作):
        let result = repo
            .create(new_user("alice@example.com"), Timestamp::new(20))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(RepositoryError::EmailTaken(_))));
    }

    #[tokio::test]
    async fn test_unknown_email_is_none() {
        // テスト項目: 未登録のメールアドレスは None になる
        let repo = InMemoryUserRepository::new();
        let found = repo
            .find_by_email(&Email::new("nobody@example.com".to_string()).unwrap())
            .await
            .unwrap();
        assert_eq!(found, None);
    }
}
