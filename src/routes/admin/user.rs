use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::error::AppResult;
use crate::models::{
    user::{self, UserForm},
    Page, PageParams, User,
};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>, Query(params): Query<PageParams>) -> AppResult<Json<Page<User>>> {
    Ok(Json(user::list(&state.db, &params, state.config.admin.page_size).await?))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<User>> {
    Ok(Json(user::get(&state.db, id).await?))
}

pub async fn create(State(state): State<AppState>, Json(form): Json<UserForm>) -> AppResult<(StatusCode, Json<User>)> {
    let created = user::create(&state.db, &state.crypto, form).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<UserForm>,
) -> AppResult<Json<User>> {
    Ok(Json(user::update(&state.db, &state.crypto, id, form).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
    user::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
