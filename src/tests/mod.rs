//! Integration and unit tests for the real-estate admin backend.
//!
//! ## Test Modules
//!
//! - **config_tests**: configuration layering and validation
//! - **db_tests**: schema creation and foreign-key behaviour
//! - **error_tests**: error rendering and form validators
//! - **auth_api_tests**: login, logout and the admin gate
//! - **admin_api_tests**: CRUD views for roles, users, properties and images
//! - **health_api_tests**: probes, version info and security headers
//!
//! Individual modules can be run with e.g. `cargo test admin_api_tests`.

pub mod auth_api_tests;
pub mod config_tests;

#[cfg(test)]
pub(crate) mod support {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::auth::AuthCrypto;
    use crate::config::AppConfig;
    use crate::models::{
        role,
        user::{self, User, UserForm},
    };
    use crate::state::AppState;

    pub const PASSWORD: &str = "correct horse battery staple";

    /// A fully wired application over a throwaway database and storage dir.
    pub struct TestApp {
        pub dir: TempDir,
        pub state: AppState,
        pub app: Router,
    }

    impl TestApp {
        pub fn storage_dir(&self) -> std::path::PathBuf {
            self.dir.path().join("static")
        }
    }

    pub async fn setup() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.database.url = format!("sqlite:{}", dir.path().join("test.db").display());
        config.database.max_connections = 4;
        config.database.create_schema = true;
        config.storage.base_path = dir.path().join("static").display().to_string();
        config.security.secret_key = "test-secret".to_string();

        let pool = crate::db::connect(&config.database).await.unwrap();
        crate::db::init_db(&pool).await.unwrap();

        let crypto = AuthCrypto::for_tests("test-secret").unwrap();
        let state = AppState::with_crypto(pool, config, crypto);
        state.images.ensure_base_dir().unwrap();
        crate::bootstrap::seed(&state, None).await.unwrap();

        let app = crate::routes::router(state.clone());
        TestApp { dir, state, app }
    }

    /// Creates an active account holding the named roles.
    pub async fn create_user(state: &AppState, email: &str, roles: &[&str]) -> User {
        let mut role_ids = Vec::new();
        for name in roles {
            role_ids.push(role::ensure(&state.db, name, None).await.unwrap().id);
        }
        let form = UserForm {
            first_name: Some("Test".to_string()),
            last_name: None,
            email: email.to_string(),
            password: Some(PASSWORD.to_string()),
            active: Some(true),
            confirmed_at: None,
            roles: Some(role_ids),
        };
        user::create(&state.db, &state.crypto, form).await.unwrap()
    }

    pub fn login_request(email: &str, password: &str, next: Option<&str>) -> Request<Body> {
        let mut body = format!("email={}&password={}", urlencoding::encode(email), urlencoding::encode(password));
        if let Some(next) = next {
            body.push_str(&format!("&next={}", urlencoding::encode(next)));
        }
        Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    /// Logs in through `/login` and returns the `name=value` cookie pair.
    pub async fn login(app: &Router, email: &str) -> String {
        let res = app.clone().oneshot(login_request(email, PASSWORD, None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        let set_cookie = res.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    pub async fn superuser_cookie(t: &TestApp) -> String {
        create_user(&t.state, "admin@example.com", &[role::SUPERUSER]).await;
        login(&t.app, "admin@example.com").await
    }

    pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    pub fn json_request(method: &str, uri: &str, cookie: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::COOKIE, cookie)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub async fn body_json(res: axum::response::Response) -> Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    pub async fn body_text(res: axum::response::Response) -> String {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }
}
