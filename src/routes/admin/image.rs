use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::{
    image::{self, NewImage},
    Image, Page, PageParams,
};
use crate::state::AppState;
use crate::storage::{thumbnail_name, ImageStore};

/// An image row as shown in the admin list, with its thumbnail preview.
#[derive(Debug, Serialize)]
pub struct ImageItem {
    #[serde(flatten)]
    pub image: Image,
    /// `/static/<thumb>` when the thumbnail is on disk, else empty.
    pub thumbnail: String,
}

impl ImageItem {
    fn new(store: &ImageStore, image: Image) -> Self {
        let thumbnail = thumbnail_url(store, image.path.as_deref());
        Self { image, thumbnail }
    }
}

pub fn thumbnail_url(store: &ImageStore, path: Option<&str>) -> String {
    match path {
        Some(p) if !p.is_empty() && store.thumbnail_exists(p) => format!("/static/{}", thumbnail_name(p)),
        _ => String::new(),
    }
}

/// Fields of a multipart image form. Absent fields are `None`.
#[derive(Debug, Default)]
struct Submission {
    name: Option<String>,
    property_id: Option<Option<i64>>,
    file: Option<(String, Vec<u8>)>,
}

async fn read_submission(mut multipart: Multipart) -> AppResult<Submission> {
    let mut sub = Submission::default();
    while let Some(field) = multipart.next_field().await.map_err(|e| AppError::BadRequest(e.to_string()))? {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "name" => {
                sub.name = Some(field.text().await.map_err(|e| AppError::BadRequest(e.to_string()))?);
            }
            "property_id" => {
                let raw = field.text().await.map_err(|e| AppError::BadRequest(e.to_string()))?;
                let raw = raw.trim();
                sub.property_id = Some(if raw.is_empty() {
                    None
                } else {
                    Some(raw.parse().map_err(|_| AppError::validation("property_id", "Not a valid integer"))?)
                });
            }
            "path" => {
                let file_name = field.file_name().map(str::to_string).unwrap_or_default();
                let data = field.bytes().await.map_err(|e| AppError::BadRequest(e.to_string()))?;
                // An empty file input means "keep the current file".
                if !file_name.is_empty() && !data.is_empty() {
                    sub.file = Some((file_name, data.to_vec()));
                }
            }
            other => return Err(AppError::validation(other, "Unknown field")),
        }
    }
    Ok(sub)
}

pub async fn list(State(state): State<AppState>, Query(params): Query<PageParams>) -> AppResult<Json<Page<ImageItem>>> {
    let page = image::list(&state.db, &params, state.config.admin.page_size).await?;
    Ok(Json(page.map(|img| ImageItem::new(&state.images, img))))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<ImageItem>> {
    let img = image::get(&state.db, id).await?;
    Ok(Json(ImageItem::new(&state.images, img)))
}

/// POST /admin/image/ (multipart: `name`, `property_id`, file `path`)
pub async fn create(State(state): State<AppState>, multipart: Multipart) -> AppResult<(StatusCode, Json<ImageItem>)> {
    let sub = read_submission(multipart).await?;
    let name = sub.name.unwrap_or_default();
    let property_id = sub.property_id.flatten();
    image::precheck(&state.db, &name, property_id).await?;

    let path = match sub.file {
        Some((file_name, bytes)) => Some(state.images.save(&file_name, bytes).await?),
        None => None,
    };

    let created = match image::create(&state.db, NewImage { name, path: path.clone(), property_id }).await {
        Ok(img) => img,
        Err(e) => {
            if let Some(p) = &path {
                state.images.remove(p).await;
            }
            return Err(e);
        }
    };
    Ok((StatusCode::CREATED, Json(ImageItem::new(&state.images, created))))
}

/// PUT /admin/image/{id}. Fields left out of the form keep their value; a new
/// file replaces the old one, whose files are then removed.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> AppResult<Json<ImageItem>> {
    let existing = image::get(&state.db, id).await?;
    let sub = read_submission(multipart).await?;
    let name = sub.name.unwrap_or_else(|| existing.name.clone());
    let property_id = sub.property_id.unwrap_or(existing.property_id);
    image::precheck(&state.db, &name, property_id).await?;

    let new_path = match sub.file {
        Some((file_name, bytes)) => Some(state.images.save(&file_name, bytes).await?),
        None => None,
    };
    let path = new_path.clone().or_else(|| existing.path.clone());

    let updated = match image::update(&state.db, id, NewImage { name, path, property_id }).await {
        Ok(img) => img,
        Err(e) => {
            if let Some(p) = new_path.as_deref().filter(|p| Some(*p) != existing.path.as_deref()) {
                state.images.remove(p).await;
            }
            return Err(e);
        }
    };

    if let (Some(new), Some(old)) = (new_path.as_deref(), existing.path.as_deref()) {
        if new != old && !old.is_empty() {
            remove_unreferenced(&state, old).await;
        }
    }
    Ok(Json(ImageItem::new(&state.images, updated)))
}

/// Removes the files behind `path` unless another image row still uses them.
/// A failed lookup keeps the files.
async fn remove_unreferenced(state: &AppState, path: &str) {
    match image::path_in_use(&state.db, path).await {
        Ok(false) => state.images.remove(path).await,
        Ok(true) => tracing::debug!("Keeping {}: still referenced by another image", path),
        Err(e) => tracing::warn!("Keeping {}: reference check failed: {}", path, e),
    }
}

/// DELETE /admin/image/{id}. The row goes first; the original and thumbnail
/// are then removed best-effort, so missing files never block the delete.
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
    let removed = image::delete(&state.db, id).await?;
    if let Some(path) = removed.path.as_deref().filter(|p| !p.is_empty()) {
        remove_unreferenced(&state, path).await;
    }
    Ok(StatusCode::NO_CONTENT)
}
