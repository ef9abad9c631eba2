use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Sqlite, SqlitePool};
use tracing::info;

use crate::config::DatabaseConfig;

/// Opens the pool, creating the SQLite file first when `create_schema` is set.
///
/// Foreign keys are per-connection in SQLite, so they are switched on for
/// every pooled connection.
pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    if cfg.create_schema && !Sqlite::database_exists(&cfg.url).await.unwrap_or(false) {
        info!("Creating SQLite database at {}", cfg.url);
        Sqlite::create_database(&cfg.url).await?;
    }
    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.max_connections)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys=ON;").execute(&mut *conn).await?;
                let _ = sqlx::query("PRAGMA busy_timeout=10000;").execute(&mut *conn).await;
                Ok(())
            })
        })
        .connect(&cfg.url)
        .await?;
    Ok(pool)
}

pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    if let Err(e) = sqlx::query("PRAGMA journal_mode=WAL;").execute(pool).await {
        tracing::warn!("Failed to set WAL journal mode: {}", e);
    }
    sqlx::query("PRAGMA foreign_keys=ON;").execute(pool).await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS role (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS "user" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NULL,
            last_name TEXT NULL,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            active BOOLEAN NOT NULL DEFAULT 1,
            confirmed_at TEXT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS roles_users (
            user_id INTEGER NOT NULL,
            role_id INTEGER NOT NULL,
            PRIMARY KEY (user_id, role_id),
            FOREIGN KEY(user_id) REFERENCES "user"(id) ON DELETE CASCADE,
            FOREIGN KEY(role_id) REFERENCES role(id) ON DELETE CASCADE
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS property (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            price TEXT NOT NULL DEFAULT '',
            typeprop TEXT NOT NULL DEFAULT '',
            contract TEXT NOT NULL DEFAULT '',
            location TEXT NOT NULL DEFAULT '',
            state TEXT NOT NULL DEFAULT '',
            city TEXT NOT NULL DEFAULT '',
            bathrooms TEXT NOT NULL DEFAULT '',
            bedrooms TEXT NOT NULL DEFAULT '',
            area TEXT NOT NULL DEFAULT '',
            features TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            pub_date TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now'))
        )"#,
    )
    .execute(pool)
    .await?;

    // Images outlive their property; the link is cleared like the ORM relationship did.
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS image (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL DEFAULT '',
            path TEXT NULL,
            property_id INTEGER NULL,
            FOREIGN KEY(property_id) REFERENCES property(id) ON DELETE SET NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS session (
            token_hash TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL,
            FOREIGN KEY(user_id) REFERENCES "user"(id) ON DELETE CASCADE
        )"#,
    )
    .execute(pool)
    .await?;

    let indexes = [
        ("idx_roles_users_role", "CREATE INDEX IF NOT EXISTS idx_roles_users_role ON roles_users(role_id)"),
        ("idx_image_property", "CREATE INDEX IF NOT EXISTS idx_image_property ON image(property_id)"),
        ("idx_session_user", "CREATE INDEX IF NOT EXISTS idx_session_user ON session(user_id)"),
        ("idx_session_expires", "CREATE INDEX IF NOT EXISTS idx_session_expires ON session(expires_at)"),
    ];
    for (name, query) in indexes {
        if let Err(e) = sqlx::query(query).execute(pool).await {
            tracing::warn!("Failed to create index {}: {}", name, e);
        }
    }

    Ok(())
}
