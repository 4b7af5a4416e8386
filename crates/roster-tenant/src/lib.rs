//! Multi-tenancy core for Roster
//!
//! Every organization ("tenant") owns a dedicated database. This crate provides:
//! - Tenant resolution from sticky client state, explicit overrides and hostnames
//! - A registry holding one connection pool and one session factory per tenant
//! - Request-scoped database sessions that are released on every exit path

pub mod tenant;
pub mod resolver;
pub mod registry;
pub mod session;

pub use tenant::*;
pub use resolver::*;
pub use registry::*;
pub use session::*;

use thiserror::Error;

/// Multi-tenancy errors
#[derive(Error, Debug)]
pub enum TenantError {
    /// Identifier is not part of the configured tenant set
    #[error("Unknown tenant: {0}")]
    UnknownTenant(String),

    #[error("Invalid tenant configuration: {0}")]
    Configuration(String),

    /// A session was requested before the registry entry existed
    #[error("Tenant not initialized: {0}")]
    NotInitialized(String),

    #[error("Connection to tenant {tenant} failed: {source}")]
    Connection {
        tenant: String,
        #[source]
        source: sqlx::Error,
    },

    /// The session was swept at the end of its request and holds no connection
    #[error("Session {session} of tenant {tenant} was already released")]
    Released { tenant: String, session: String },

    #[error("Schema sync failed for tenant {tenant}: {source}")]
    Schema {
        tenant: String,
        #[source]
        source: sqlx::Error,
    },
}

impl TenantError {
    /// True for errors caused by the client's choice of tenant rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnknownTenant(_))
    }
}

pub type Result<T> = std::result::Result<T, TenantError>;
