//! Middleware components for HTTP request processing.
//!
//! - `auth`: session → [`crate::auth::Identity`] resolution and the admin gate
//! - `security_headers`: hardening and cache headers on every response

pub mod auth;
pub mod security_headers;
