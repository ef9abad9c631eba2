//! Admin views: one CRUD surface per entity, all behind
//! [`crate::middleware::auth::require_superuser`].

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::middleware::auth::CurrentIdentity;
use crate::state::AppState;

pub mod image;
pub mod property;
pub mod role;
pub mod user;

/// (display name, list URL) of every admin view.
pub const VIEWS: &[(&str, &str)] = &[
    ("Role", "/admin/role/"),
    ("User", "/admin/user/"),
    ("Property", "/admin/property/"),
    ("Image", "/admin/image/"),
];

/// GET /admin/
pub async fn admin_index(State(state): State<AppState>, CurrentIdentity(identity): CurrentIdentity) -> Json<Value> {
    let views: Vec<Value> = VIEWS.iter().map(|(name, url)| json!({ "name": name, "url": url })).collect();
    Json(json!({
        "title": state.config.admin.title,
        "user": identity.map(|i| i.email),
        "views": views,
        "logout": "/logout",
    }))
}
