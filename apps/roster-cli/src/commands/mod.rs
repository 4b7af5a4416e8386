pub mod admin;
pub mod schema;
pub mod tenants;

use anyhow::{Context, Result};
use roster_core::AppConfig;
use roster_tenant::{ConnectionRegistry, TenantDirectory, TenantId};
use std::path::Path;
use std::sync::Arc;

/// Load configuration and build an (empty) registry over the configured tenants
pub(crate) fn load_registry(config_path: &Path) -> Result<Arc<ConnectionRegistry>> {
    let config = AppConfig::load_from_file(config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;
    let directory = Arc::new(
        TenantDirectory::from_config(&config.tenancy).context("Invalid tenant configuration")?,
    );
    Ok(Arc::new(ConnectionRegistry::new(directory, config.database)))
}

/// Resolve a tenant argument against the configured set
pub(crate) fn configured_tenant(registry: &ConnectionRegistry, raw: &str) -> Result<TenantId> {
    registry
        .directory()
        .lookup(raw)
        .with_context(|| format!("Unknown tenant: {}", raw))
}
