use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::error::{validation, AppError, AppResult, OptionExt};
use crate::models::{Page, PageParams};

const PROPERTY_COLUMNS: &str = "id, price, typeprop, contract, location, state, city, bathrooms, bedrooms, \
                                area, features, description, pub_date";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Property {
    pub id: i64,
    pub price: String,
    pub typeprop: String,
    pub contract: String,
    pub location: String,
    pub state: String,
    pub city: String,
    pub bathrooms: String,
    pub bedrooms: String,
    pub area: String,
    pub features: String,
    pub description: String,
    pub pub_date: DateTime<Utc>,
}

/// The editable columns of a property. Anything else, `pub_date` included,
/// is rejected at deserialization. Missing fields default to the empty string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PropertyForm {
    /// Only honoured on create.
    pub id: Option<i64>,
    pub price: String,
    pub typeprop: String,
    pub contract: String,
    pub location: String,
    pub state: String,
    pub city: String,
    pub bathrooms: String,
    pub bedrooms: String,
    pub area: String,
    pub features: String,
    pub description: String,
}

impl PropertyForm {
    fn columns(&self) -> [(&'static str, &str, usize); 11] {
        [
            ("price", &self.price, 80),
            ("typeprop", &self.typeprop, 80),
            ("contract", &self.contract, 80),
            ("location", &self.location, 80),
            ("state", &self.state, 80),
            ("city", &self.city, 80),
            ("bathrooms", &self.bathrooms, 10),
            ("bedrooms", &self.bedrooms, 10),
            ("area", &self.area, 20),
            ("features", &self.features, 80),
            ("description", &self.description, 250),
        ]
    }

    pub fn validate(&self) -> AppResult<()> {
        if let Some(id) = self.id {
            if id <= 0 {
                return Err(AppError::validation("id", "Must be a positive integer"));
            }
        }
        for (field, value, max) in self.columns() {
            validation::validate_max_len(value, field, max)?;
        }
        Ok(())
    }
}

pub async fn list(pool: &SqlitePool, params: &PageParams, default_size: u32) -> AppResult<Page<Property>> {
    let (limit, offset) = params.limit_offset(default_size);
    let items = sqlx::query_as::<_, Property>(&format!(
        "SELECT {} FROM property ORDER BY id LIMIT ?1 OFFSET ?2",
        PROPERTY_COLUMNS
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM property").fetch_one(pool).await?;
    Ok(Page::new(items, params, default_size, total))
}

pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<Property> {
    sqlx::query_as::<_, Property>(&format!("SELECT {} FROM property WHERE id = ?1", PROPERTY_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_not_found("Property")
}

pub async fn exists(pool: &SqlitePool, id: i64) -> AppResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM property WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Inserts a property stamped with the current time as `pub_date`.
pub async fn create(pool: &SqlitePool, form: PropertyForm) -> AppResult<Property> {
    create_at(pool, form, Utc::now()).await
}

pub async fn create_at(pool: &SqlitePool, form: PropertyForm, pub_date: DateTime<Utc>) -> AppResult<Property> {
    form.validate()?;
    if let Some(id) = form.id {
        if exists(pool, id).await? {
            return Err(AppError::validation("id", "Already exists"));
        }
    }

    let id = sqlx::query(
        r#"INSERT INTO property
           (id, price, typeprop, contract, location, state, city, bathrooms, bedrooms, area, features, description, pub_date)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"#,
    )
    .bind(form.id)
    .bind(&form.price)
    .bind(&form.typeprop)
    .bind(&form.contract)
    .bind(&form.location)
    .bind(&form.state)
    .bind(&form.city)
    .bind(&form.bathrooms)
    .bind(&form.bedrooms)
    .bind(&form.area)
    .bind(&form.features)
    .bind(&form.description)
    .bind(pub_date)
    .execute(pool)
    .await?
    .last_insert_rowid();

    get(pool, id).await
}

/// Rewrites the editable columns; `id` and `pub_date` stay as they are.
pub async fn update(pool: &SqlitePool, id: i64, form: PropertyForm) -> AppResult<Property> {
    form.validate()?;
    if let Some(form_id) = form.id {
        if form_id != id {
            return Err(AppError::validation("id", "Cannot change the id of an existing property"));
        }
    }

    let res = sqlx::query(
        r#"UPDATE property
           SET price = ?1, typeprop = ?2, contract = ?3, location = ?4, state = ?5, city = ?6,
               bathrooms = ?7, bedrooms = ?8, area = ?9, features = ?10, description = ?11
           WHERE id = ?12"#,
    )
    .bind(&form.price)
    .bind(&form.typeprop)
    .bind(&form.contract)
    .bind(&form.location)
    .bind(&form.state)
    .bind(&form.city)
    .bind(&form.bathrooms)
    .bind(&form.bedrooms)
    .bind(&form.area)
    .bind(&form.features)
    .bind(&form.description)
    .bind(id)
    .execute(pool)
    .await?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound("Property not found".to_string()));
    }

    get(pool, id).await
}

pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    let res = sqlx::query("DELETE FROM property WHERE id = ?1").bind(id).execute(pool).await?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound("Property not found".to_string()));
    }
    Ok(())
}
