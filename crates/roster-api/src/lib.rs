//! HTTP API for Roster
//!
//! Every request is resolved to one tenant before it reaches a handler; handlers
//! then work against that tenant's database only.

pub mod error;
pub mod rest;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use rest::middleware::{AuthUser, TenantContext};
pub use rest::router::create_router;
pub use state::AppState;
