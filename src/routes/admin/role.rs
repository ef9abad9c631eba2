use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::error::AppResult;
use crate::models::{
    role::{self, RoleForm},
    Page, PageParams, Role,
};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>, Query(params): Query<PageParams>) -> AppResult<Json<Page<Role>>> {
    Ok(Json(role::list(&state.db, &params, state.config.admin.page_size).await?))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Role>> {
    Ok(Json(role::get(&state.db, id).await?))
}

pub async fn create(State(state): State<AppState>, Json(form): Json<RoleForm>) -> AppResult<(StatusCode, Json<Role>)> {
    let created = role::create(&state.db, form).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<RoleForm>,
) -> AppResult<Json<Role>> {
    Ok(Json(role::update(&state.db, id, form).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
    role::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
