use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::auth::{check_access, session, Access, Identity};
use crate::error::AppError;
use crate::models::role::SUPERUSER;
use crate::state::AppState;

/// Resolves the session cookie into an [`Identity`] and stores it in the
/// request extensions. Requests without a valid session pass through untouched.
pub async fn identity_middleware(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if let Some(token) = session::token_from_headers(req.headers()) {
        match session::resolve(&state.db, &state.crypto, &token).await {
            Ok(Some(identity)) => {
                req.extensions_mut().insert(identity);
            }
            Ok(None) => {}
            Err(e) => return e.into_response(),
        }
    }
    next.run(req).await
}

/// Extractor for the identity resolved by [`identity_middleware`], if any.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Option<Identity>);

impl<S: Send + Sync> FromRequestParts<S> for CurrentIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Identity>().cloned()))
    }
}

/// Gate for the admin views: only active sessions holding the superuser role
/// get through. Anonymous clients are sent to the login page with the
/// original location in `next`; everyone else gets a 403.
pub async fn require_superuser(req: Request, next: Next) -> Response {
    match check_access(req.extensions().get::<Identity>(), SUPERUSER) {
        Access::Granted => next.run(req).await,
        Access::LoginRequired => Redirect::to(&login_url(req.uri())).into_response(),
        Access::Forbidden => {
            if let Some(identity) = req.extensions().get::<Identity>() {
                tracing::warn!(user_id = identity.user_id, "Denied admin access to {}", req.uri().path());
            }
            AppError::Forbidden("You do not have permission to view this resource".to_string()).into_response()
        }
    }
}

/// `/login?next=<percent-encoded path and query>`
pub fn login_url(uri: &Uri) -> String {
    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    format!("/login?next={}", urlencoding::encode(target))
}
