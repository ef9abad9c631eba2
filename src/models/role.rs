use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::error::{unique_violation, validation, AppError, AppResult, OptionExt};
use crate::models::{Page, PageParams};

/// The role checked by the admin access gate.
pub const SUPERUSER: &str = "superuser";
/// The default role seeded next to [`SUPERUSER`].
pub const USER: &str = "user";

const NAME_MAX: usize = 80;
const DESCRIPTION_MAX: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleForm {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl RoleForm {
    pub fn validate(&self) -> AppResult<()> {
        validation::validate_required(&self.name, "name")?;
        validation::validate_max_len(&self.name, "name", NAME_MAX)?;
        validation::validate_optional_max_len(self.description.as_deref(), "description", DESCRIPTION_MAX)
    }
}

pub async fn list(pool: &SqlitePool, params: &PageParams, default_size: u32) -> AppResult<Page<Role>> {
    let (limit, offset) = params.limit_offset(default_size);
    let items = sqlx::query_as::<_, Role>("SELECT id, name, description FROM role ORDER BY id LIMIT ?1 OFFSET ?2")
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM role").fetch_one(pool).await?;
    Ok(Page::new(items, params, default_size, total))
}

pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<Role> {
    sqlx::query_as::<_, Role>("SELECT id, name, description FROM role WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_not_found("Role")
}

pub async fn find_by_name(pool: &SqlitePool, name: &str) -> AppResult<Option<Role>> {
    Ok(sqlx::query_as::<_, Role>("SELECT id, name, description FROM role WHERE name = ?1")
        .bind(name)
        .fetch_optional(pool)
        .await?)
}

async fn ensure_name_free(pool: &SqlitePool, name: &str, except_id: Option<i64>) -> AppResult<()> {
    let taken: Option<i64> = sqlx::query_scalar("SELECT id FROM role WHERE name = ?1 AND id != ?2")
        .bind(name)
        .bind(except_id.unwrap_or(-1))
        .fetch_optional(pool)
        .await?;
    if taken.is_some() {
        return Err(AppError::validation("name", "Already exists"));
    }
    Ok(())
}

pub async fn create(pool: &SqlitePool, form: RoleForm) -> AppResult<Role> {
    form.validate()?;
    let name = form.name.trim().to_string();
    ensure_name_free(pool, &name, None).await?;

    let id = sqlx::query("INSERT INTO role (name, description) VALUES (?1, ?2)")
        .bind(&name)
        .bind(&form.description)
        .execute(pool)
        .await
        .map_err(unique_violation("name"))?
        .last_insert_rowid();
    Ok(Role { id, name, description: form.description })
}

pub async fn update(pool: &SqlitePool, id: i64, form: RoleForm) -> AppResult<Role> {
    form.validate()?;
    get(pool, id).await?;
    let name = form.name.trim().to_string();
    ensure_name_free(pool, &name, Some(id)).await?;

    sqlx::query("UPDATE role SET name = ?1, description = ?2 WHERE id = ?3")
        .bind(&name)
        .bind(&form.description)
        .bind(id)
        .execute(pool)
        .await
        .map_err(unique_violation("name"))?;
    Ok(Role { id, name, description: form.description })
}

pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    let res = sqlx::query("DELETE FROM role WHERE id = ?1").bind(id).execute(pool).await?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound("Role not found".to_string()));
    }
    Ok(())
}

/// Returns the role with `name`, creating it when missing.
pub async fn ensure(pool: &SqlitePool, name: &str, description: Option<&str>) -> AppResult<Role> {
    if let Some(role) = find_by_name(pool, name).await? {
        return Ok(role);
    }
    create(pool, RoleForm { name: name.to_string(), description: description.map(str::to_string) }).await
}
