use std::sync::Arc;

use crate::auth::AuthCrypto;
use crate::config::AppConfig;
use crate::storage::ImageStore;

/// The shared application state.
///
/// Cloned into every handler by Axum. Nothing in here is mutated after
/// startup; per-request data (the caller's identity) travels in request
/// extensions instead.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: sqlx::SqlitePool,
    /// The application configuration.
    pub config: Arc<AppConfig>,
    /// Password and session-token hashing, keyed by `security.secret_key`.
    pub crypto: Arc<AuthCrypto>,
    /// Upload and thumbnail storage under `storage.base_path`.
    pub images: Arc<ImageStore>,
}

impl AppState {
    /// Builds the state with production Argon2 costs.
    pub fn new(db: sqlx::SqlitePool, config: AppConfig) -> anyhow::Result<Self> {
        let crypto = AuthCrypto::new(config.security.secret_key.as_bytes())?;
        Ok(Self::with_crypto(db, config, crypto))
    }

    pub fn with_crypto(db: sqlx::SqlitePool, config: AppConfig, crypto: AuthCrypto) -> Self {
        let images = ImageStore::new(&config.storage);
        Self { db, config: Arc::new(config), crypto: Arc::new(crypto), images: Arc::new(images) }
    }

    /// Session lifetime in seconds.
    pub fn session_ttl_secs(&self) -> i64 {
        (self.config.security.session_ttl_hours as i64) * 3600
    }
}
