//! Identity & access: password and token hashing, login sessions, and the
//! role check guarding the admin views.

pub mod access;
pub mod crypto;
pub mod session;

pub use access::{check_access, is_authorized, Access, Identity};
pub use crypto::AuthCrypto;
