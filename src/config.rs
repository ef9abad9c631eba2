use std::path::Path;

use serde::Deserialize;

/// Secret shipped in `config/default.toml`; only acceptable for local development.
pub const DEVELOPMENT_SECRET_KEY: &str = "development-secret-key-change-me";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Create the database file and tables on startup.
    pub create_schema: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Keys the HMAC used to hash session tokens before they are stored.
    pub secret_key: String,
    pub session_ttl_hours: u64,
    pub cookie_secure: bool,
    pub enable_hsts: bool,
    pub hsts_max_age: u64,
    pub csp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding uploaded images and their thumbnails. Image rows store
    /// paths relative to it.
    pub base_path: String,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    pub thumbnail_crop: bool,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub title: String,
    pub page_size: u32,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct BootstrapConfig {
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub admin_first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub storage: StorageConfig,
    pub admin: AdminConfig,
    pub bootstrap: Option<BootstrapConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let defaults: &str = include_str!("../config/default.toml");
        match ::config::Config::builder()
            .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
            .build()
        {
            Ok(cfg) => match cfg.try_deserialize() {
                Ok(app_cfg) => app_cfg,
                Err(e) => panic!("Failed to deserialize default config: {}", e),
            },
            Err(e) => panic!("Failed to parse default config: {}", e),
        }
    }
}

/// Loads the configuration: embedded defaults -> `realestate.toml` (CWD) ->
/// `$REALESTATE_CONFIG` -> `REALESTATE__*` environment variables.
pub fn load() -> anyhow::Result<AppConfig> {
    let _ = dotenvy::dotenv();
    let custom = std::env::var("REALESTATE_CONFIG").ok();
    load_with(custom.as_deref().map(Path::new))
}

/// Same layering as [`load`], with an explicit extra file in place of
/// `$REALESTATE_CONFIG`.
pub fn load_with(extra_file: Option<&Path>) -> anyhow::Result<AppConfig> {
    let defaults: &str = include_str!("../config/default.toml");
    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
        .add_source(::config::File::with_name("realestate").required(false));

    if let Some(path) = extra_file {
        let name = path.to_string_lossy();
        builder = builder.add_source(::config::File::new(&name, ::config::FileFormat::Toml).required(false));
    }
    builder = builder.add_source(::config::Environment::with_prefix("REALESTATE").separator("__"));

    let cfg = builder.build()?;
    let app_cfg: AppConfig = cfg.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

pub fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    if cfg.server.port == 0 {
        return Err(anyhow::anyhow!("invalid server.port: {}", cfg.server.port));
    }
    #[cfg(unix)]
    if cfg.server.port < 1024 {
        tracing::warn!("Using privileged port {} - may require elevated permissions", cfg.server.port);
    }

    if cfg.database.max_connections == 0 {
        return Err(anyhow::anyhow!("database.max_connections must be > 0"));
    }

    if cfg.security.secret_key.trim().is_empty() {
        return Err(anyhow::anyhow!("security.secret_key must not be empty"));
    }
    if cfg.security.secret_key == DEVELOPMENT_SECRET_KEY {
        tracing::warn!("security.secret_key is the built-in development key; set a real one outside development");
    }
    if cfg.security.session_ttl_hours == 0 {
        return Err(anyhow::anyhow!("security.session_ttl_hours must be > 0"));
    }

    if cfg.storage.base_path.trim().is_empty() {
        return Err(anyhow::anyhow!("storage.base_path must not be empty"));
    }
    if cfg.storage.thumbnail_width == 0 || cfg.storage.thumbnail_height == 0 {
        return Err(anyhow::anyhow!("storage thumbnail dimensions must be > 0"));
    }
    if cfg.storage.max_upload_bytes == 0 {
        return Err(anyhow::anyhow!("storage.max_upload_bytes must be > 0"));
    }

    if cfg.admin.page_size == 0 {
        return Err(anyhow::anyhow!("admin.page_size must be > 0"));
    }

    if let Some(boot) = &cfg.bootstrap {
        if boot.admin_email.is_some() != boot.admin_password.is_some() {
            return Err(anyhow::anyhow!(
                "bootstrap.admin_email and bootstrap.admin_password must be set together"
            ));
        }
    }

    Ok(())
}

pub fn ensure_sqlite_parent_dir(url: &str) -> anyhow::Result<()> {
    if let Some(path) = url.strip_prefix("sqlite://") {
        let path = path.split('?').next().unwrap_or(path);
        let p = Path::new(path);
        if let Some(parent) = p.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }
    Ok(())
}
