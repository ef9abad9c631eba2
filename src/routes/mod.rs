//! HTTP routes and the application router.
//!
//! - `index`: public landing page
//! - `auth`: login form, login, logout
//! - `admin`: CRUD views per entity, gated by the superuser check
//! - `health`: liveness/readiness probes and version info

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    response::Redirect,
    routing::get,
    Router,
};
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};

use crate::middleware::{
    auth::{identity_middleware, require_superuser},
    security_headers::security_headers_middleware,
};
use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod health;
pub mod index;

fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/admin/", get(admin::admin_index))
        .route("/admin/role/", get(admin::role::list).post(admin::role::create))
        .route(
            "/admin/role/{id}",
            get(admin::role::get).put(admin::role::update).delete(admin::role::delete),
        )
        .route("/admin/user/", get(admin::user::list).post(admin::user::create))
        .route(
            "/admin/user/{id}",
            get(admin::user::get).put(admin::user::update).delete(admin::user::delete),
        )
        .route("/admin/property/", get(admin::property::list).post(admin::property::create))
        .route(
            "/admin/property/{id}",
            get(admin::property::get).put(admin::property::update).delete(admin::property::delete),
        )
        .route("/admin/image/", get(admin::image::list).post(admin::image::create))
        .route(
            "/admin/image/{id}",
            get(admin::image::get).put(admin::image::update).delete(admin::image::delete),
        )
        .route_layer(from_fn(require_superuser))
}

/// Builds the full application: public pages, login/logout, the gated admin
/// views, uploaded files under `/static`, and the cross-cutting layers.
pub fn router(state: AppState) -> Router {
    let static_files = ServeDir::new(state.images.base_path());

    Router::new()
        .route("/", get(index::index))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout).post(auth::logout))
        .route("/admin", get(|| async { Redirect::permanent("/admin/") }))
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/version", get(health::version))
        .merge(admin_router())
        .nest_service("/static", static_files)
        .layer(DefaultBodyLimit::max(state.config.storage.max_upload_bytes))
        .layer(from_fn_with_state(state.clone(), identity_middleware))
        .with_state(state.clone())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(state.config.clone(), security_headers_middleware))
}
