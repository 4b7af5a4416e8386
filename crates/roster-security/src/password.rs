//! Password hashing and validation
//!
//! Admin passwords are stored as Argon2id PHC strings.

use crate::error::{Result, SecurityError};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Password configuration
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// Minimum password length
    pub min_length: usize,
    /// Maximum password length
    pub max_length: usize,
    /// Require at least one letter and one digit
    pub require_mixed: bool,
    /// Argon2 memory cost (in KiB)
    pub argon2_memory_cost: u32,
    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,
    /// Argon2 parallelism
    pub argon2_parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 10,
            max_length: 128,
            require_mixed: true,
            argon2_memory_cost: 19456, // 19 MiB
            argon2_time_cost: 2,
            argon2_parallelism: 1,
        }
    }
}

/// Password manager for hashing and verification
#[derive(Debug, Clone)]
pub struct PasswordManager {
    config: PasswordConfig,
    argon2: Argon2<'static>,
}

impl PasswordManager {
    pub fn new(config: PasswordConfig) -> Result<Self> {
        let params = Params::new(
            config.argon2_memory_cost,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| SecurityError::Configuration(format!("Invalid Argon2 params: {}", e)))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        Ok(Self { config, argon2 })
    }

    pub fn default_config() -> Result<Self> {
        Self::new(PasswordConfig::default())
    }

    /// Validate password against policy
    pub fn validate_password(&self, password: &str) -> Result<()> {
        let mut errors = Vec::new();
        let length = password.chars().count();

        if length < self.config.min_length {
            errors.push(format!(
                "Password must be at least {} characters",
                self.config.min_length
            ));
        }

        if length > self.config.max_length {
            errors.push(format!(
                "Password must be at most {} characters",
                self.config.max_length
            ));
        }

        if self.config.require_mixed
            && !(password.chars().any(|c| c.is_alphabetic())
                && password.chars().any(|c| c.is_ascii_digit()))
        {
            errors.push("Password must contain letters and digits".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SecurityError::PasswordValidation(errors.join("; ")))
        }
    }

    /// Validate and hash a password
    pub fn hash_password(&self, password: &str) -> Result<String> {
        self.validate_password(password)?;

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| SecurityError::PasswordHashingFailed(e.to_string()))?;

        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| SecurityError::PasswordHashingFailed(format!("Invalid hash: {}", e)))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(SecurityError::PasswordHashingFailed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_manager() -> PasswordManager {
        PasswordManager::new(PasswordConfig {
            argon2_memory_cost: 4096, // Lower for tests
            argon2_time_cost: 1,
            argon2_parallelism: 1,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let manager = create_test_manager();
        let hash = manager.hash_password("treasurer2026").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(manager.verify_password("treasurer2026", &hash).unwrap());
        assert!(!manager.verify_password("treasurer2027", &hash).unwrap());
    }

    #[test]
    fn test_password_validation() {
        let manager = create_test_manager();

        assert!(manager.validate_password("lodge-secretary-1").is_ok());
        assert!(manager.validate_password("short1").is_err());
        assert!(manager.validate_password("nodigitsatallhere").is_err());
        assert!(manager.validate_password("1234567890123").is_err());
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        let manager = create_test_manager();
        assert!(matches!(
            manager.verify_password("anything1", "not-a-phc-string"),
            Err(SecurityError::PasswordHashingFailed(_))
        ));
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let manager = create_test_manager();

        let hash1 = manager.hash_password("chapter-admin-9").unwrap();
        let hash2 = manager.hash_password("chapter-admin-9").unwrap();

        assert_ne!(hash1, hash2);
        assert!(manager.verify_password("chapter-admin-9", &hash1).unwrap());
        assert!(manager.verify_password("chapter-admin-9", &hash2).unwrap());
    }
}
