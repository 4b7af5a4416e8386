//! `roster create-admin`

use anyhow::{Context, Result};
use roster_infra::{users, TenantSchema};
use roster_security::{PasswordManager, Role};
use roster_tenant::{RequestScope, SessionProvider};
use std::path::Path;

use crate::output;

pub async fn run(
    config_path: &Path,
    tenant: &str,
    username: &str,
    role: &str,
    password: &str,
) -> Result<()> {
    let role = Role::parse(role)?;
    let registry = super::load_registry(config_path)?;
    let tenant = super::configured_tenant(&registry, tenant)?;

    registry.ensure(&tenant)?;
    registry
        .schema_sync(&tenant, &TenantSchema)
        .await
        .context("Failed to synchronize tenant schema")?;

    let hash = PasswordManager::default_config()?.hash_password(password)?;

    let sessions = SessionProvider::new(registry.clone());
    let user = {
        let mut session = sessions.acquire(&tenant, RequestScope::new()).await?;
        let created = users::create(&mut *session.conn()?, username, &hash, role).await?;
        created
    };

    registry.close_all().await;

    output::success(&format!("Created {} '{}'", user.role, user.username));
    output::key_value("Tenant", tenant.as_str());
    output::key_value("User ID", &user.id.to_string());
    Ok(())
}
