use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

/// Password hashing (Argon2id, PHC strings) and session-token hashing
/// (HMAC-SHA-256 keyed by the configured secret key).
#[derive(Debug)]
pub struct AuthCrypto {
    argon2: Argon2<'static>,
    token_key: Vec<u8>,
    /// Verified against when the account does not exist, so unknown and
    /// known e-mails cost the same.
    dummy_hash: String,
}

#[derive(Debug, Error)]
pub enum AuthCryptoError {
    #[error("secret key must not be empty")]
    EmptySecretKey,
    #[error("invalid Argon2 parameters: {0}")]
    InvalidParams(String),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
    #[error("hashing task failed: {0}")]
    Task(String),
}

impl From<argon2::password_hash::Error> for AuthCryptoError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AuthCryptoError::PasswordHash(err.to_string())
    }
}

impl AuthCrypto {
    /// Argon2id with the crate's default cost parameters.
    pub fn new(secret_key: impl AsRef<[u8]>) -> Result<Self, AuthCryptoError> {
        Self::with_params(secret_key, Params::default())
    }

    /// Caller-chosen Argon2 costs; tests use this to keep hashing cheap.
    pub fn with_params(secret_key: impl AsRef<[u8]>, params: Params) -> Result<Self, AuthCryptoError> {
        let key = secret_key.as_ref();
        if key.is_empty() {
            return Err(AuthCryptoError::EmptySecretKey);
        }
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::default(), params);
        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = argon2.hash_password(b"not-a-real-password", &salt)?.to_string();
        Ok(Self { argon2, token_key: key.to_vec(), dummy_hash })
    }

    /// Low-cost parameters for test suites.
    pub fn for_tests(secret_key: impl AsRef<[u8]>) -> Result<Self, AuthCryptoError> {
        let params = Params::new(1024, 1, 1, None).map_err(|e| AuthCryptoError::InvalidParams(e.to_string()))?;
        Self::with_params(secret_key, params)
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthCryptoError> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(self.argon2.hash_password(password.as_bytes(), &salt)?.to_string())
    }

    /// `Ok(false)` for a wrong password; `Err` only when the stored hash is unreadable.
    pub fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool, AuthCryptoError> {
        let parsed = PasswordHash::new(password_hash)?;
        Ok(self.argon2.verify_password(password.as_bytes(), &parsed).is_ok())
    }

    /// [`hash_password`](Self::hash_password) on the blocking pool.
    pub async fn hash_password_blocking(self: Arc<Self>, password: String) -> Result<String, AuthCryptoError> {
        tokio::task::spawn_blocking(move || self.hash_password(&password))
            .await
            .map_err(|e| AuthCryptoError::Task(e.to_string()))?
    }

    /// Verifies on the blocking pool. Without a stored hash the password is
    /// checked against the dummy hash and the result is always `false`.
    pub async fn verify_password_blocking(
        self: Arc<Self>,
        password: String,
        password_hash: Option<String>,
    ) -> Result<bool, AuthCryptoError> {
        tokio::task::spawn_blocking(move || match password_hash {
            Some(hash) => self.verify_password(&password, &hash),
            None => self.verify_password(&password, &self.dummy_hash).map(|_| false),
        })
        .await
        .map_err(|e| AuthCryptoError::Task(e.to_string()))?
    }

    /// Hex HMAC-SHA-256 of an opaque session token, as stored in `session.token_hash`.
    pub fn hash_token(&self, token: &str) -> String {
        type HmacSha256 = Hmac<Sha256>;

        let mut mac = HmacSha256::new_from_slice(&self.token_key).expect("HMAC-SHA-256 accepts keys of any size");
        mac.update(token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}
