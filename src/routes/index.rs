use axum::response::{Html, IntoResponse};

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

// Public landing page
pub async fn index() -> impl IntoResponse {
    Html(INDEX_TEMPLATE)
}
