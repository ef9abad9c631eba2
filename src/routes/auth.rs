use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use crate::auth::{is_authorized, session};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentIdentity;
use crate::models::{role::SUPERUSER, user};
use crate::state::AppState;

/// Where a successful login lands when no usable `next` was given.
pub const DEFAULT_AFTER_LOGIN: &str = "/admin/";

const LOGIN_TEMPLATE: &str = include_str!("../../templates/login.html");

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Only same-site absolute paths are followed after login; anything else
/// (external URLs, scheme-relative `//host`, empty) falls back to the admin index.
pub fn safe_next(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => n.to_string(),
        _ => DEFAULT_AFTER_LOGIN.to_string(),
    }
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// GET /login
pub async fn login_page(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Query(q): Query<NextQuery>,
) -> Response {
    let next = safe_next(q.next.as_deref());
    if is_authorized(identity.as_ref(), SUPERUSER) {
        return Redirect::to(&next).into_response();
    }
    let page = LOGIN_TEMPLATE
        .replace("{{title}}", &html_escape(&state.config.admin.title))
        .replace("{{next}}", &html_escape(&next));
    Html(page).into_response()
}

/// POST /login
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> AppResult<Response> {
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let found = user::find_by_email(&state.db, &form.email).await?;
    let stored_hash = found.as_ref().map(|u| u.password.clone());
    let verified = state
        .crypto
        .clone()
        .verify_password_blocking(form.password.clone(), stored_hash)
        .await?;
    let Some(user) = found else {
        tracing::info!("Login failed for unknown email {}", form.email.trim());
        return Err(invalid());
    };
    if !verified {
        tracing::info!(user_id = user.id, "Login failed: wrong password");
        return Err(invalid());
    }
    if !user.active {
        tracing::info!(user_id = user.id, "Login refused: account disabled");
        return Err(AppError::Unauthorized("Account is disabled".to_string()));
    }

    let purged = session::purge_expired(&state.db).await?;
    if purged > 0 {
        tracing::debug!("Purged {} expired sessions", purged);
    }
    let ttl = state.session_ttl_secs();
    let token = session::create(&state.db, &state.crypto, user.id, ttl).await?;
    tracing::info!(user_id = user.id, "User logged in");

    let cookie = session::session_cookie(&token, ttl, state.config.security.cookie_secure);
    let target = safe_next(form.next.as_deref());
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(&target)).into_response())
}

/// GET|POST /logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    if let Some(token) = session::token_from_headers(&headers) {
        session::revoke(&state.db, &state.crypto, &token).await?;
    }
    let cookie = session::clear_cookie(state.config.security.cookie_secure);
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response())
}
