//! JWT token management
//!
//! Access tokens carry the tenant they were issued for; a token is only
//! accepted on requests resolved to that same tenant.

use crate::error::{Result, SecurityError};
use crate::rbac::Role;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use roster_core::AuthConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Longest token lifetime honoured, 30 days
pub const MAX_EXPIRY_SECS: i64 = 30 * 24 * 60 * 60;

/// JWT token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (admin user id)
    pub sub: String,
    pub username: String,
    pub role: Role,
    /// Tenant the token was issued for
    pub tenant: String,
    /// Token ID
    pub jti: String,
    pub iss: String,
    pub aud: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl Claims {
    /// Reject claims minted for a different tenant
    pub fn ensure_tenant(&self, tenant: &str) -> Result<()> {
        if self.tenant == tenant {
            Ok(())
        } else {
            Err(SecurityError::TenantMismatch(tenant.to_string()))
        }
    }
}

/// Issued access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub expiry_secs: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            issuer: "roster".to_string(),
            audience: "roster-admin".to_string(),
            expiry_secs: 3600,
        }
    }
}

impl From<&AuthConfig> for JwtConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            expiry_secs: i64::try_from(config.token_expiry_seconds)
                .unwrap_or(MAX_EXPIRY_SECS)
                .min(MAX_EXPIRY_SECS),
        }
    }
}

/// JWT token manager
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .field("keys", &"[REDACTED]")
            .finish()
    }
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    pub fn from_secret(secret: &str) -> Self {
        Self::new(JwtConfig {
            secret: secret.to_string(),
            ..Default::default()
        })
    }

    /// Issue an access token for an admin user of `tenant`
    pub fn issue(&self, user_id: i64, username: &str, role: Role, tenant: &str) -> Result<AccessToken> {
        let expiry_secs = self.config.expiry_secs.clamp(-MAX_EXPIRY_SECS, MAX_EXPIRY_SECS);
        let now = Utc::now();
        let exp = now + Duration::seconds(expiry_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role,
            tenant: tenant.to_string(),
            jti: Uuid::new_v4().to_string(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;

        Ok(AccessToken {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: expiry_secs,
        })
    }

    /// Validate signature, expiry, issuer and audience
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        let token_data: TokenData<Claims> = decode(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }

    /// Validate and check the token belongs to `tenant`
    pub fn validate_for_tenant(&self, token: &str, tenant: &str) -> Result<Claims> {
        let claims = self.validate(token)?;
        if let Err(err) = claims.ensure_tenant(tenant) {
            debug!(
                token_tenant = %claims.tenant,
                request_tenant = %tenant,
                "Rejected token issued for another tenant"
            );
            return Err(err);
        }
        Ok(claims)
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_manager() -> JwtManager {
        JwtManager::from_secret("test-secret-key-for-testing-only")
    }

    #[test]
    fn test_issue_and_validate() {
        let manager = create_test_manager();
        let token = manager.issue(7, "secretary", Role::Officer, "acme").unwrap();

        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, 3600);

        let claims = manager.validate(&token.access_token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.username, "secretary");
        assert_eq!(claims.role, Role::Officer);
        assert_eq!(claims.tenant, "acme");
    }

    #[test]
    fn test_token_is_bound_to_tenant() {
        let manager = create_test_manager();
        let token = manager.issue(1, "admin", Role::Admin, "acme").unwrap();

        assert!(manager.validate_for_tenant(&token.access_token, "acme").is_ok());
        assert!(matches!(
            manager.validate_for_tenant(&token.access_token, "globex"),
            Err(SecurityError::TenantMismatch(_))
        ));
    }

    #[test]
    fn test_expired_token() {
        let manager = JwtManager::new(JwtConfig {
            secret: "s".to_string(),
            expiry_secs: -120,
            ..Default::default()
        });
        let token = manager.issue(1, "admin", Role::Admin, "acme").unwrap();

        assert!(matches!(
            manager.validate(&token.access_token),
            Err(SecurityError::TokenExpired)
        ));
    }

    #[test]
    fn test_invalid_token() {
        let manager = create_test_manager();
        assert!(manager.validate("invalid-token").is_err());
    }

    #[test]
    fn test_token_from_different_secret() {
        let token = JwtManager::from_secret("secret-1")
            .issue(1, "admin", Role::Admin, "acme")
            .unwrap();

        assert!(JwtManager::from_secret("secret-2")
            .validate(&token.access_token)
            .is_err());
    }

    #[test]
    fn test_config_from_auth_config() {
        let auth = AuthConfig::new("abc".to_string()).with_expiry(60);
        let config = JwtConfig::from(&auth);
        assert_eq!(config.expiry_secs, 60);
        assert_eq!(config.issuer, "roster");
    }

    #[test]
    fn test_oversized_expiry_is_capped() {
        let auth = AuthConfig::new("abc".to_string()).with_expiry(u64::MAX);
        let config = JwtConfig::from(&auth);
        assert_eq!(config.expiry_secs, MAX_EXPIRY_SECS);

        let manager = JwtManager::new(JwtConfig {
            secret: "s".to_string(),
            expiry_secs: i64::MAX,
            ..Default::default()
        });
        let token = manager.issue(1, "admin", Role::Admin, "acme").unwrap();
        assert_eq!(token.expires_in, MAX_EXPIRY_SECS);

        let claims = manager.validate(&token.access_token).unwrap();
        assert_eq!(claims.exp - claims.iat, MAX_EXPIRY_SECS);
    }
}
