//! Security error types

use thiserror::Error;

/// Result type alias for security operations
pub type Result<T> = std::result::Result<T, SecurityError>;

/// Security-related errors
#[derive(Error, Debug)]
pub enum SecurityError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Authorization failed (insufficient permissions)
    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    /// Token is invalid or malformed
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token has expired
    #[error("Token expired")]
    TokenExpired,

    /// Token was issued for another tenant
    #[error("Token not valid for tenant {0}")]
    TenantMismatch(String),

    /// Password does not meet requirements
    #[error("Password validation failed: {0}")]
    PasswordValidation(String),

    /// Password hashing failed
    #[error("Password hashing failed: {0}")]
    PasswordHashingFailed(String),

    /// Invalid role
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    /// Configuration error
    #[error("Security configuration error: {0}")]
    Configuration(String),

    /// JWT library error
    #[error("JWT error: {0}")]
    Jwt(jsonwebtoken::errors::Error),
}

impl From<jsonwebtoken::errors::Error> for SecurityError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => SecurityError::TokenExpired,
            _ => SecurityError::Jwt(err),
        }
    }
}

impl SecurityError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            SecurityError::AuthenticationFailed(_) => 401,
            SecurityError::AuthorizationFailed(_) => 403,
            SecurityError::InvalidToken(_) => 401,
            SecurityError::TokenExpired => 401,
            SecurityError::TenantMismatch(_) => 403,
            SecurityError::PasswordValidation(_) => 422,
            SecurityError::PasswordHashingFailed(_) => 500,
            SecurityError::InvalidRole(_) => 422,
            SecurityError::Configuration(_) => 500,
            SecurityError::Jwt(_) => 401,
        }
    }

    /// Get error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            SecurityError::AuthenticationFailed(_) => "AUTHENTICATION_FAILED",
            SecurityError::AuthorizationFailed(_) => "AUTHORIZATION_FAILED",
            SecurityError::InvalidToken(_) => "INVALID_TOKEN",
            SecurityError::TokenExpired => "TOKEN_EXPIRED",
            SecurityError::TenantMismatch(_) => "TENANT_MISMATCH",
            SecurityError::PasswordValidation(_) => "PASSWORD_VALIDATION_FAILED",
            SecurityError::PasswordHashingFailed(_) => "PASSWORD_HASHING_FAILED",
            SecurityError::InvalidRole(_) => "INVALID_ROLE",
            SecurityError::Configuration(_) => "CONFIGURATION_ERROR",
            SecurityError::Jwt(_) => "JWT_ERROR",
        }
    }
}
