use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::auth::crypto::AuthCrypto;
use crate::error::{unique_violation, validation, AppError, AppResult, OptionExt};
use crate::models::{Page, PageParams, Role};

const NAME_MAX: usize = 255;
const EMAIL_MAX: usize = 255;

const USER_COLUMNS: &str = r#"id, first_name, last_name, email, password, active, confirmed_at"#;

/// A login account. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub active: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    pub roles: Vec<Role>,
}

impl User {
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.name == name)
    }
}

/// Create/edit form. `password` is plaintext here and hashed before storage.
/// On edit, an absent `password`, `active`, `confirmed_at` or `roles` keeps
/// the stored value.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserForm {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub roles: Option<Vec<i64>>,
}

impl UserForm {
    pub fn validate(&self) -> AppResult<()> {
        validation::validate_required(&self.email, "email")?;
        validation::validate_max_len(&self.email, "email", EMAIL_MAX)?;
        validation::validate_email(&self.email, "email")?;
        validation::validate_optional_max_len(self.first_name.as_deref(), "first_name", NAME_MAX)?;
        validation::validate_optional_max_len(self.last_name.as_deref(), "last_name", NAME_MAX)?;
        if let Some(pw) = &self.password {
            validation::validate_required(pw, "password")?;
        }
        Ok(())
    }
}

async fn roles_for(pool: &SqlitePool, user_id: i64) -> AppResult<Vec<Role>> {
    Ok(sqlx::query_as::<_, Role>(
        r#"SELECT r.id, r.name, r.description
           FROM role r JOIN roles_users ru ON ru.role_id = r.id
           WHERE ru.user_id = ?1
           ORDER BY r.id"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

async fn with_roles(pool: &SqlitePool, mut user: User) -> AppResult<User> {
    user.roles = roles_for(pool, user.id).await?;
    Ok(user)
}

pub async fn list(pool: &SqlitePool, params: &PageParams, default_size: u32) -> AppResult<Page<User>> {
    let (limit, offset) = params.limit_offset(default_size);
    let rows = sqlx::query_as::<_, User>(&format!(
        r#"SELECT {} FROM "user" ORDER BY id LIMIT ?1 OFFSET ?2"#,
        USER_COLUMNS
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    let mut items = Vec::with_capacity(rows.len());
    for user in rows {
        items.push(with_roles(pool, user).await?);
    }
    let total: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "user""#).fetch_one(pool).await?;
    Ok(Page::new(items, params, default_size, total))
}

pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<User> {
    let user = sqlx::query_as::<_, User>(&format!(r#"SELECT {} FROM "user" WHERE id = ?1"#, USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_not_found("User")?;
    with_roles(pool, user).await
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(r#"SELECT {} FROM "user" WHERE email = ?1"#, USER_COLUMNS))
        .bind(email.trim())
        .fetch_optional(pool)
        .await?;
    match user {
        Some(u) => Ok(Some(with_roles(pool, u).await?)),
        None => Ok(None),
    }
}

async fn ensure_email_free(pool: &SqlitePool, email: &str, except_id: Option<i64>) -> AppResult<()> {
    let taken: Option<i64> = sqlx::query_scalar(r#"SELECT id FROM "user" WHERE email = ?1 AND id != ?2"#)
        .bind(email)
        .bind(except_id.unwrap_or(-1))
        .fetch_optional(pool)
        .await?;
    if taken.is_some() {
        return Err(AppError::validation("email", "Already exists"));
    }
    Ok(())
}

async fn ensure_roles_exist(pool: &SqlitePool, role_ids: &[i64]) -> AppResult<()> {
    for role_id in role_ids {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM role WHERE id = ?1")
            .bind(role_id)
            .fetch_optional(pool)
            .await?;
        if found.is_none() {
            return Err(AppError::validation("roles", format!("Unknown role id {}", role_id)));
        }
    }
    Ok(())
}

fn dedup_roles(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

pub async fn create(pool: &SqlitePool, crypto: &Arc<AuthCrypto>, form: UserForm) -> AppResult<User> {
    form.validate()?;
    let password = form
        .password
        .clone()
        .ok_or_else(|| AppError::validation("password", "This field is required"))?;
    let email = form.email.trim().to_string();
    ensure_email_free(pool, &email, None).await?;
    let role_ids = dedup_roles(form.roles.clone().unwrap_or_default());
    ensure_roles_exist(pool, &role_ids).await?;

    let hash = crypto.clone().hash_password_blocking(password).await?;

    let mut tx = pool.begin().await?;
    let id = sqlx::query(
        r#"INSERT INTO "user" (first_name, last_name, email, password, active, confirmed_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
    )
    .bind(&form.first_name)
    .bind(&form.last_name)
    .bind(&email)
    .bind(&hash)
    .bind(form.active.unwrap_or(true))
    .bind(form.confirmed_at)
    .execute(&mut *tx)
    .await
    .map_err(unique_violation("email"))?
    .last_insert_rowid();

    for role_id in &role_ids {
        sqlx::query("INSERT INTO roles_users (user_id, role_id) VALUES (?1, ?2)")
            .bind(id)
            .bind(role_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    tracing::info!(user_id = id, "Created user {}", email);
    get(pool, id).await
}

pub async fn update(pool: &SqlitePool, crypto: &Arc<AuthCrypto>, id: i64, form: UserForm) -> AppResult<User> {
    form.validate()?;
    let existing = get(pool, id).await?;
    let email = form.email.trim().to_string();
    ensure_email_free(pool, &email, Some(id)).await?;
    let role_ids = form.roles.as_deref().map(|ids| dedup_roles(ids.to_vec()));
    if let Some(ids) = &role_ids {
        ensure_roles_exist(pool, ids).await?;
    }

    let hash = match form.password.clone() {
        Some(pw) => crypto.clone().hash_password_blocking(pw).await?,
        None => existing.password,
    };

    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"UPDATE "user"
           SET first_name = ?1, last_name = ?2, email = ?3, password = ?4, active = ?5, confirmed_at = ?6
           WHERE id = ?7"#,
    )
    .bind(&form.first_name)
    .bind(&form.last_name)
    .bind(&email)
    .bind(&hash)
    .bind(form.active.unwrap_or(existing.active))
    .bind(form.confirmed_at.or(existing.confirmed_at))
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(unique_violation("email"))?;

    if let Some(role_ids) = &role_ids {
        sqlx::query("DELETE FROM roles_users WHERE user_id = ?1").bind(id).execute(&mut *tx).await?;
        for role_id in role_ids {
            sqlx::query("INSERT INTO roles_users (user_id, role_id) VALUES (?1, ?2)")
                .bind(id)
                .bind(role_id)
                .execute(&mut *tx)
                .await?;
        }
    }
    tx.commit().await?;

    get(pool, id).await
}

pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    let res = sqlx::query(r#"DELETE FROM "user" WHERE id = ?1"#).bind(id).execute(pool).await?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    Ok(())
}
