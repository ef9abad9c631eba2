#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::NamedTempFile;

    use crate::config::{self, AppConfig, BootstrapConfig, DEVELOPMENT_SECRET_KEY};

    fn write_temp_config(content: &str) -> NamedTempFile {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), content).unwrap();
        temp_file
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.database.url, "sqlite://data/realestate.db");
        assert!(config.database.create_schema);
        assert_eq!(config.security.secret_key, DEVELOPMENT_SECRET_KEY);
        assert_eq!(config.security.session_ttl_hours, 24);
        assert!(!config.security.cookie_secure);
        assert_eq!(config.storage.base_path, "static");
        assert_eq!((config.storage.thumbnail_width, config.storage.thumbnail_height), (100, 100));
        assert!(config.storage.thumbnail_crop);
        assert_eq!(config.admin.title, "Admin real estate");
        assert!(config.bootstrap.is_none());
        assert!(config::validate(&config).is_ok());
    }

    #[test]
    fn test_extra_file_overrides_defaults() {
        let file = write_temp_config(
            r#"
            [server]
            port = 8088

            [admin]
            title = "Listings"

            [bootstrap]
            admin_email = "root@example.com"
            admin_password = "s3cret"
            "#,
        );

        let config = config::load_with(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.admin.title, "Listings");
        assert_eq!(config.admin.page_size, 20);
        let boot = config.bootstrap.unwrap();
        assert_eq!(boot.admin_email.as_deref(), Some("root@example.com"));
        assert!(boot.admin_first_name.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config::validate(&config).unwrap_err().to_string().contains("invalid server.port"));

        let mut config = AppConfig::default();
        config.security.secret_key = "  ".to_string();
        assert!(config::validate(&config).is_err());

        let mut config = AppConfig::default();
        config.storage.thumbnail_height = 0;
        assert!(config::validate(&config).is_err());

        let mut config = AppConfig::default();
        config.admin.page_size = 0;
        assert!(config::validate(&config).is_err());
    }

    #[test]
    fn test_bootstrap_credentials_come_in_pairs() {
        let mut config = AppConfig::default();
        config.bootstrap = Some(BootstrapConfig {
            admin_email: Some("root@example.com".to_string()),
            ..Default::default()
        });
        assert!(config::validate(&config).is_err());

        config.bootstrap = Some(BootstrapConfig::default());
        assert!(config::validate(&config).is_ok());
    }

    #[test]
    fn test_ensure_sqlite_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("app.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());

        config::ensure_sqlite_parent_dir(&url).unwrap();
        assert!(dir.path().join("nested").is_dir());

        // Non-file URLs are left alone.
        config::ensure_sqlite_parent_dir("sqlite::memory:").unwrap();
    }
}
