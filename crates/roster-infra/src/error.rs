//! Persistence error types

use roster_core::DomainError;
use roster_tenant::TenantError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, InfraError>;

#[derive(Error, Debug)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A unique constraint rejected the write
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error("Report generation failed: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Tenant(#[from] TenantError),

    /// A stored value could not be interpreted
    #[error("Corrupt {column} value: {value}")]
    Corrupt { column: &'static str, value: String },
}

impl InfraError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Map a unique violation to `Conflict`, pass everything else through
    pub(crate) fn on_unique(err: sqlx::Error, message: impl FnOnce() -> String) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Conflict(message()),
            _ => Self::Database(err),
        }
    }
}
