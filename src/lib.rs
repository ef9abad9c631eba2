//! # Real-Estate Admin Backend Library
//!
//! Admin backend for real-estate listings: a SQLite schema of users, roles,
//! properties and property images, exposed through session-authenticated CRUD
//! endpoints that only superusers may use.
//!
//! ## Architecture
//!
//! - **Axum**: HTTP server, routing and middleware
//! - **SQLx**: asynchronous SQLite access
//! - **Argon2 / HMAC-SHA-256**: password hashing and session-token hashing
//! - **image**: thumbnails for uploaded pictures
//!
//! ## Core Components
//!
//! - [`config`]: layered configuration (embedded defaults, TOML file, env)
//! - [`db`]: pool setup and schema creation
//! - [`models`]: entities and their queries
//! - [`auth`]: credentials, sessions, and the access predicate
//! - [`storage`]: upload and thumbnail files
//! - [`middleware`]: identity resolution, admin gate, security headers
//! - [`routes`]: landing page, login/logout, admin views, health probes
//! - [`bootstrap`]: default roles and an optional initial admin
//! - [`error`]: the application error type and its HTTP rendering
//! - [`state`]: shared application state

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod storage;

#[cfg(test)]
mod tests;
