//! Application wiring: configuration, tenant registry, security

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use roster_api::AppState;
use roster_core::AppConfig;
use roster_infra::TenantSchema;
use roster_security::{JwtConfig, JwtManager, PasswordManager};
use roster_tenant::{ConnectionRegistry, TenantDirectory};

use crate::cli::Args;
use crate::server::Server;

pub struct App {
    config: AppConfig,
    registry: Arc<ConnectionRegistry>,
    state: AppState,
}

impl App {
    /// Load configuration and bring every tenant database up to date.
    ///
    /// A tenant that cannot be reached or migrated aborts startup.
    pub async fn build(args: Args) -> Result<Self> {
        let mut config = AppConfig::load_from_file(&args.config)
            .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;
        if let Some(port) = args.port {
            config.server.port = port;
        }

        let directory = Arc::new(
            TenantDirectory::from_config(&config.tenancy).context("Invalid tenant configuration")?,
        );
        info!(
            tenants = directory.len(),
            default_tenant = %directory.default_tenant(),
            "Tenant directory loaded"
        );

        let registry = Arc::new(ConnectionRegistry::new(directory, config.database.clone()));
        registry
            .initialize_all()
            .context("Failed to create tenant connection pools")?;
        registry
            .sync_all(&TenantSchema)
            .await
            .context("Failed to synchronize tenant schemas")?;

        let jwt = JwtManager::new(JwtConfig::from(&config.auth));
        let passwords =
            PasswordManager::default_config().context("Failed to configure password hashing")?;

        let state = AppState::new(
            registry.clone(),
            jwt,
            passwords,
            config.tenancy.cookie_name.clone(),
        );

        Ok(Self {
            config,
            registry,
            state,
        })
    }

    pub async fn run(self) -> Result<()> {
        let server = Server::new(self.config.server.address(), self.state);
        let result = server.run().await;

        self.registry.close_all().await;
        result
    }
}
