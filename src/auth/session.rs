use axum::http::{header, HeaderMap};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use sqlx::SqlitePool;

use crate::auth::access::Identity;
use crate::auth::crypto::AuthCrypto;
use crate::error::AppResult;
use crate::models::user;

pub const SESSION_COOKIE: &str = "realestate_session";
const TOKEN_LEN: usize = 64;

/// Generate a cryptographically secure session token
pub fn generate_session_token() -> String {
    thread_rng().sample_iter(&Alphanumeric).take(TOKEN_LEN).map(char::from).collect()
}

/// Persists a new session for `user_id` and returns the cookie token.
/// Only the token's HMAC reaches the database.
pub async fn create(pool: &SqlitePool, crypto: &AuthCrypto, user_id: i64, ttl_secs: i64) -> AppResult<String> {
    let token = generate_session_token();
    let now = chrono::Utc::now().timestamp();
    sqlx::query("INSERT INTO session (token_hash, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)")
        .bind(crypto.hash_token(&token))
        .bind(user_id)
        .bind(now)
        .bind(now + ttl_secs)
        .execute(pool)
        .await?;
    Ok(token)
}

/// Looks up the identity behind a cookie token. Unknown or expired tokens
/// resolve to `None`.
pub async fn resolve(pool: &SqlitePool, crypto: &AuthCrypto, token: &str) -> AppResult<Option<Identity>> {
    let now = chrono::Utc::now().timestamp();
    let user_id: Option<i64> = sqlx::query_scalar("SELECT user_id FROM session WHERE token_hash = ?1 AND expires_at > ?2")
        .bind(crypto.hash_token(token))
        .bind(now)
        .fetch_optional(pool)
        .await?;
    let Some(user_id) = user_id else {
        return Ok(None);
    };
    let user = user::get(pool, user_id).await?;
    Ok(Some(Identity::from(&user)))
}

pub async fn revoke(pool: &SqlitePool, crypto: &AuthCrypto, token: &str) -> AppResult<()> {
    sqlx::query("DELETE FROM session WHERE token_hash = ?1")
        .bind(crypto.hash_token(token))
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn purge_expired(pool: &SqlitePool) -> AppResult<u64> {
    let now = chrono::Utc::now().timestamp();
    let res = sqlx::query("DELETE FROM session WHERE expires_at <= ?1").bind(now).execute(pool).await?;
    Ok(res.rows_affected())
}

/// Extracts the session token from the `Cookie` request header(s).
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn session_cookie(token: &str, ttl_secs: i64, secure: bool) -> String {
    let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}", SESSION_COOKIE, token, ttl_secs);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}
