//! # Roster Security
//!
//! Authentication and authorization for the Roster admin panel:
//! - Argon2id password hashing and policy checks
//! - JWT access tokens bound to a single tenant
//! - Role-based permission checks for route handlers

pub mod jwt;
pub mod password;
pub mod rbac;
pub mod error;

pub use jwt::*;
pub use password::*;
pub use rbac::*;
pub use error::{SecurityError, Result};
