//! `roster sync-schema`

use anyhow::Result;
use roster_infra::TenantSchema;
use std::path::Path;

use crate::output;

pub async fn run(config_path: &Path, tenant: Option<&str>) -> Result<()> {
    let registry = super::load_registry(config_path)?;

    let tenants = match tenant {
        Some(raw) => vec![super::configured_tenant(&registry, raw)?],
        None => registry.directory().ids().cloned().collect(),
    };

    output::section("Schema sync");
    let mut failed = 0;
    for tenant in &tenants {
        registry.ensure(tenant)?;
        match registry.schema_sync(tenant, &TenantSchema).await {
            Ok(()) => output::success(tenant.as_str()),
            Err(e) => {
                failed += 1;
                output::failure(&format!("{}: {}", tenant, e));
            }
        }
    }

    registry.close_all().await;

    if failed > 0 {
        anyhow::bail!("{} of {} tenants failed", failed, tenants.len());
    }
    Ok(())
}
