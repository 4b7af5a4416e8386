//! Persistence for Roster tenant databases
//!
//! Every repository function works on a tenant session's connection, so the
//! caller decides which tenant a query runs against.

pub mod error;
pub mod schema;
pub mod members;
pub mod dues;
pub mod attendance;
pub mod referrals;
pub mod users;
pub mod reports;

mod rows;

pub use error::{InfraError, Result};
pub use schema::TenantSchema;
pub use users::AdminUser;
