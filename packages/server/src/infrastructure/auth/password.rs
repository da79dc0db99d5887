//! Argon2id によるパスワードハッシュ
//!
//! ハッシュは PHC 文字列（`$argon2id$v=19$...`）で保存する。ソルトは毎回生成する。

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use crate::domain::{AuthError, CredentialHasher, Password};

pub struct Argon2CredentialHasher {
    params: Params,
}

impl Argon2CredentialHasher {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    /// メモリ量（KiB）・反復回数・並列度を指定する
    pub fn with_cost(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, AuthError> {
        Params::new(memory_kib, iterations, parallelism, None)
            .map(Self::new)
            .map_err(|e| AuthError::HashFailed(e.to_string()))
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::default(), self.params.clone())
    }
}

impl Default for Argon2CredentialHasher {
    /// m=19456 KiB, t=2, p=1
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl CredentialHasher for Argon2CredentialHasher {
    fn hash(&self, password: &Password) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher()
            .hash_password(password.expose().as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::HashFailed(e.to_string()))
    }

    fn verify(&self, password: &str, password_hash: &str) -> Result<bool, AuthError> {
        let parsed =
            PasswordHash::new(password_hash).map_err(|e| AuthError::HashFailed(e.to_string()))?;
        match self.hasher().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::HashFailed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light_hasher() -> Argon2CredentialHasher {
        Argon2CredentialHasher::with_cost(8, 1, 1).unwrap()
    }

    fn password(value: &str) -> Password {
        Password::new(value.to_string()).unwrap()
    }

    #[test]
    fn test_hash_verifies_only_the_original_password() {
        // テスト項目: ハッシュは元のパスワードでのみ一致し、平文を含まない
        // given (前提条件):
        let hasher = light_hasher();
        let hash = hasher.hash(&password("correct horse")).unwrap();

        // when (操作):
        let right = hasher.verify("correct horse", &hash);
        let wrong = hasher.verify("battery staple", &hash);

        // then (期待する結果):
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("correct horse"));
        assert_eq!(right, Ok(true));
        assert_eq!(wrong, Ok(false));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        // テスト項目: 同じパスワードでもハッシュは毎回異なる
        let hasher = light_hasher();
        let first = hasher.hash(&password("correct horse")).unwrap();
        let second = hasher.hash(&password("correct horse")).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_unreadable_hash_is_an_error() {
        // テスト項目: PHC 形式でないハッシュは照合エラーになる
        let hasher = light_hasher();
        assert!(matches!(
            hasher.verify("correct horse", "plaintext"),
            Err(AuthError::HashFailed(_))
        ));
    }
}
