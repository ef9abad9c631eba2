use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::error::AppResult;
use crate::models::{
    property::{self, PropertyForm},
    Page, PageParams, Property,
};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>, Query(params): Query<PageParams>) -> AppResult<Json<Page<Property>>> {
    Ok(Json(property::list(&state.db, &params, state.config.admin.page_size).await?))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Property>> {
    Ok(Json(property::get(&state.db, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(form): Json<PropertyForm>,
) -> AppResult<(StatusCode, Json<Property>)> {
    let created = property::create(&state.db, form).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<PropertyForm>,
) -> AppResult<Json<Property>> {
    Ok(Json(property::update(&state.db, id, form).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
    property::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
