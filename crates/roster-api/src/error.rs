//! API error type and its JSON rendering

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use roster_core::DomainError;
use roster_infra::InfraError;
use roster_security::SecurityError;
use roster_tenant::TenantError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unknown tenant: {0}")]
    UnknownTenant(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownTenant(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownTenant(_) => "UNKNOWN_TENANT",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Unavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<TenantError> for ApiError {
    fn from(err: TenantError) -> Self {
        match err {
            TenantError::UnknownTenant(tenant) => Self::UnknownTenant(tenant),
            TenantError::Connection { .. } => Self::Unavailable(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<InfraError> for ApiError {
    fn from(err: InfraError) -> Self {
        match err {
            InfraError::NotFound { .. } => Self::NotFound(err.to_string()),
            InfraError::Conflict(message) => Self::Conflict(message),
            InfraError::Invalid(domain) => domain.into(),
            InfraError::Tenant(tenant) => tenant.into(),
            InfraError::Database(sqlx::Error::PoolTimedOut) => {
                Self::Unavailable("tenant database is busy".to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<SecurityError> for ApiError {
    fn from(err: SecurityError) -> Self {
        match err.status_code() {
            401 => Self::Unauthorized(err.to_string()),
            403 => Self::Forbidden(err.to_string()),
            422 => Self::Validation(err.to_string()),
            _ => Self::Internal(err.to_string()),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
            match self {
                Self::Unavailable(_) => "tenant database unavailable".to_string(),
                _ => "internal server error".to_string(),
            }
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
            self.to_string()
        };

        let body = json!({
            "error": {
                "code": self.error_code(),
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}
