use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::error::{validation, AppError, AppResult, OptionExt};
use crate::models::{property, Page, PageParams};

const NAME_MAX: usize = 64;
const PATH_MAX: usize = 128;

/// An uploaded picture of a property. `path` is relative to the storage base
/// directory and is empty until a file has been stored.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Image {
    pub id: i64,
    pub name: String,
    pub path: Option<String>,
    pub property_id: Option<i64>,
}

/// Column values for an image row, produced by the upload handler once the
/// file (if any) has been stored.
#[derive(Debug, Clone, Default)]
pub struct NewImage {
    pub name: String,
    pub path: Option<String>,
    pub property_id: Option<i64>,
}

impl NewImage {
    pub fn validate(&self) -> AppResult<()> {
        validation::validate_max_len(&self.name, "name", NAME_MAX)?;
        validation::validate_optional_max_len(self.path.as_deref(), "path", PATH_MAX)
    }
}

/// The owning property must exist when the image is written.
async fn check_property(pool: &SqlitePool, property_id: Option<i64>) -> AppResult<()> {
    let id = property_id.ok_or_else(|| AppError::validation("property_id", "This field is required"))?;
    if !property::exists(pool, id).await? {
        return Err(AppError::validation("property_id", format!("Property {} does not exist", id)));
    }
    Ok(())
}

/// Checks a submission before any file is written for it.
pub async fn precheck(pool: &SqlitePool, name: &str, property_id: Option<i64>) -> AppResult<()> {
    validation::validate_max_len(name, "name", NAME_MAX)?;
    check_property(pool, property_id).await
}

pub async fn list(pool: &SqlitePool, params: &PageParams, default_size: u32) -> AppResult<Page<Image>> {
    let (limit, offset) = params.limit_offset(default_size);
    let items = sqlx::query_as::<_, Image>(
        "SELECT id, name, path, property_id FROM image ORDER BY id LIMIT ?1 OFFSET ?2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM image").fetch_one(pool).await?;
    Ok(Page::new(items, params, default_size, total))
}

pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<Image> {
    sqlx::query_as::<_, Image>("SELECT id, name, path, property_id FROM image WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_not_found("Image")
}

pub async fn create(pool: &SqlitePool, new: NewImage) -> AppResult<Image> {
    new.validate()?;
    check_property(pool, new.property_id).await?;
    let id = sqlx::query("INSERT INTO image (name, path, property_id) VALUES (?1, ?2, ?3)")
        .bind(&new.name)
        .bind(&new.path)
        .bind(new.property_id)
        .execute(pool)
        .await?
        .last_insert_rowid();
    get(pool, id).await
}

pub async fn update(pool: &SqlitePool, id: i64, new: NewImage) -> AppResult<Image> {
    new.validate()?;
    check_property(pool, new.property_id).await?;
    let res = sqlx::query("UPDATE image SET name = ?1, path = ?2, property_id = ?3 WHERE id = ?4")
        .bind(&new.name)
        .bind(&new.path)
        .bind(new.property_id)
        .bind(id)
        .execute(pool)
        .await?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound("Image not found".to_string()));
    }
    get(pool, id).await
}

/// Whether any image row still points at `path`.
pub async fn path_in_use(pool: &SqlitePool, path: &str) -> AppResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM image WHERE path = ?1")
        .bind(path)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// Removes the row and hands it back so the caller can clean up its files.
pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<Image> {
    let image = get(pool, id).await?;
    sqlx::query("DELETE FROM image WHERE id = ?1").bind(id).execute(pool).await?;
    Ok(image)
}
