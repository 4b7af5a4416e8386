//! Tenant identifiers and the configured tenant set

use roster_core::{TenancyConfig, TenantSettings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Result, TenantError};

/// Opaque key identifying one organization
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Normalize and validate a raw key
    pub fn parse(raw: &str) -> Result<Self> {
        let key = raw.trim().to_lowercase();
        if Self::is_valid_key(&key) {
            Ok(Self(key))
        } else {
            Err(TenantError::UnknownTenant(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid_key(key: &str) -> bool {
        !key.is_empty()
            && key.len() <= 63
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Tenant id and display name, for tenant pickers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSummary {
    pub id: TenantId,
    pub display_name: String,
}

/// The statically configured tenant set.
///
/// Built once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct TenantDirectory {
    tenants: BTreeMap<TenantId, TenantSettings>,
    default_tenant: TenantId,
    base_domain: Option<String>,
}

impl TenantDirectory {
    pub fn from_config(config: &TenancyConfig) -> Result<Self> {
        if config.tenants.is_empty() {
            return Err(TenantError::Configuration(
                "no tenants configured".to_string(),
            ));
        }

        let mut tenants = BTreeMap::new();
        for (key, settings) in &config.tenants {
            let id = TenantId::parse(key).map_err(|_| {
                TenantError::Configuration(format!("invalid tenant key: {:?}", key))
            })?;

            if settings.database_url.trim().is_empty() {
                return Err(TenantError::Configuration(format!(
                    "tenant {} has no database_url",
                    id
                )));
            }

            if tenants.insert(id.clone(), settings.clone()).is_some() {
                return Err(TenantError::Configuration(format!(
                    "tenant {} configured twice",
                    id
                )));
            }
        }

        let default_tenant = TenantId::parse(&config.default_tenant)
            .ok()
            .filter(|id| tenants.contains_key(id))
            .ok_or_else(|| {
                TenantError::Configuration(format!(
                    "default tenant {:?} is not a configured tenant",
                    config.default_tenant
                ))
            })?;

        let base_domain = config
            .base_domain
            .as_deref()
            .map(|d| d.trim().trim_start_matches('.').to_lowercase())
            .filter(|d| !d.is_empty());

        Ok(Self {
            tenants,
            default_tenant,
            base_domain,
        })
    }

    pub fn contains(&self, id: &TenantId) -> bool {
        self.tenants.contains_key(id)
    }

    /// Normalize a raw key and return it only if it is configured
    pub fn lookup(&self, raw: &str) -> Option<TenantId> {
        TenantId::parse(raw).ok().filter(|id| self.contains(id))
    }

    pub fn get(&self, id: &TenantId) -> Option<&TenantSettings> {
        self.tenants.get(id)
    }

    pub fn database_url(&self, id: &TenantId) -> Result<&str> {
        self.tenants
            .get(id)
            .map(|settings| settings.database_url.as_str())
            .ok_or_else(|| {
                TenantError::Configuration(format!("no connection string for tenant {}", id))
            })
    }

    pub fn display_name(&self, id: &TenantId) -> Option<&str> {
        self.tenants.get(id).map(|s| s.display_name.as_str())
    }

    pub fn default_tenant(&self) -> &TenantId {
        &self.default_tenant
    }

    pub fn base_domain(&self) -> Option<&str> {
        self.base_domain.as_deref()
    }

    pub fn ids(&self) -> impl Iterator<Item = &TenantId> {
        self.tenants.keys()
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }

    pub fn summaries(&self) -> Vec<TenantSummary> {
        self.tenants
            .iter()
            .map(|(id, settings)| TenantSummary {
                id: id.clone(),
                display_name: settings.display_name.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenancy() -> TenancyConfig {
        TenancyConfig::new("acme")
            .with_tenant("acme", TenantSettings::new("sqlite::memory:", "Acme Lodge"))
            .with_tenant("Globex", TenantSettings::new("postgres://db/globex", "Globex Chapter"))
    }

    #[test]
    fn test_tenant_id_normalization() {
        assert_eq!(TenantId::parse("  ACME ").unwrap().as_str(), "acme");
        assert!(TenantId::parse("").is_err());
        assert!(TenantId::parse("acme.example").is_err());
        assert!(TenantId::parse("east_side-2").is_ok());
    }

    #[test]
    fn test_directory_from_config() {
        let directory = TenantDirectory::from_config(&tenancy()).unwrap();

        assert_eq!(directory.len(), 2);
        assert_eq!(directory.default_tenant().as_str(), "acme");
        assert_eq!(directory.lookup("GLOBEX").unwrap().as_str(), "globex");
        assert!(directory.lookup("initech").is_none());
        assert_eq!(
            directory.display_name(&TenantId::parse("globex").unwrap()),
            Some("Globex Chapter")
        );
    }

    #[test]
    fn test_database_url_missing_is_configuration_error() {
        let directory = TenantDirectory::from_config(&tenancy()).unwrap();
        let unknown = TenantId::parse("initech").unwrap();

        assert!(matches!(
            directory.database_url(&unknown),
            Err(TenantError::Configuration(_))
        ));
    }

    #[test]
    fn test_default_must_be_configured() {
        let mut config = tenancy();
        config.default_tenant = "initech".to_string();

        assert!(matches!(
            TenantDirectory::from_config(&config),
            Err(TenantError::Configuration(_))
        ));
    }

    #[test]
    fn test_empty_and_blank_urls_rejected() {
        assert!(TenantDirectory::from_config(&TenancyConfig::new("acme")).is_err());

        let blank = TenancyConfig::new("acme").with_tenant("acme", TenantSettings::new(" ", "Acme"));
        assert!(TenantDirectory::from_config(&blank).is_err());
    }

    #[test]
    fn test_summaries_are_ordered() {
        let directory = TenantDirectory::from_config(&tenancy()).unwrap();
        let names: Vec<_> = directory
            .summaries()
            .into_iter()
            .map(|s| s.display_name)
            .collect();

        assert_eq!(names, vec!["Acme Lodge", "Globex Chapter"]);
    }

    #[test]
    fn test_base_domain_normalized() {
        let config = tenancy().with_base_domain(".Example.COM");
        let directory = TenantDirectory::from_config(&config).unwrap();
        assert_eq!(directory.base_domain(), Some("example.com"));
    }
}
