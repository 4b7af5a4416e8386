//! Per-tenant connection registry
//!
//! Holds exactly one connection pool ("engine") and one session factory per tenant.
//! Entries are created on first use or eagerly at startup and are never evicted.

use parking_lot::Mutex;
use roster_core::DatabaseConfig;
use serde::{Deserialize, Serialize};
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use sqlx::Executor;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::{Result, SessionFactory, TenantDirectory, TenantError, TenantId};

/// SQL dialect of a tenant database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    /// Detect the dialect from a connection string scheme
    pub fn from_url(url: &str) -> Result<Self> {
        let scheme = url
            .split_once(':')
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .unwrap_or_default();

        match scheme.as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            _ => Err(TenantError::Configuration(format!(
                "unsupported database scheme {:?}",
                scheme
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }
}

/// Create-if-missing DDL for every entity table a tenant database holds
pub trait SchemaSource: Send + Sync {
    fn statements(&self, dialect: Dialect) -> Vec<String>;
}

/// Connection pool bound to one tenant database
#[derive(Debug)]
pub struct TenantEngine {
    tenant: TenantId,
    dialect: Dialect,
    pool: AnyPool,
}

impl TenantEngine {
    /// Build the pool without opening a connection
    pub fn connect_lazy(tenant: TenantId, url: &str, config: &DatabaseConfig) -> Result<Self> {
        let dialect = Dialect::from_url(url)?;

        sqlx::any::install_default_drivers();

        let mut options = AnyPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .min_connections(config.min_connections);
        if let Some(timeout) = config.acquire_timeout() {
            options = options.acquire_timeout(timeout);
        }

        let pool = options.connect_lazy(url).map_err(|e| {
            TenantError::Configuration(format!(
                "invalid connection string for tenant {}: {}",
                tenant, e
            ))
        })?;

        Ok(Self {
            tenant,
            dialect,
            pool,
        })
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

/// Registry entry: the engine and the session factory bound to it
#[derive(Debug, Clone)]
pub struct TenantEntry {
    pub engine: Arc<TenantEngine>,
    pub factory: Arc<SessionFactory>,
}

/// Owned registry of tenant engines, injected through application state
#[derive(Debug)]
pub struct ConnectionRegistry {
    directory: Arc<TenantDirectory>,
    pool_config: DatabaseConfig,
    entries: Mutex<HashMap<TenantId, TenantEntry>>,
}

impl ConnectionRegistry {
    pub fn new(directory: Arc<TenantDirectory>, pool_config: DatabaseConfig) -> Self {
        Self {
            directory,
            pool_config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn directory(&self) -> &Arc<TenantDirectory> {
        &self.directory
    }

    /// Return the tenant's entry, creating engine and factory on first call.
    ///
    /// Check and insert happen under one lock, so concurrent first calls
    /// still produce a single engine.
    pub fn ensure(&self, tenant: &TenantId) -> Result<TenantEntry> {
        let mut entries = self.entries.lock();

        if let Some(entry) = entries.get(tenant) {
            return Ok(entry.clone());
        }

        let url = self.directory.database_url(tenant)?;
        let engine = Arc::new(TenantEngine::connect_lazy(
            tenant.clone(),
            url,
            &self.pool_config,
        )?);
        let factory = Arc::new(SessionFactory::new(engine.clone()));
        let entry = TenantEntry { engine, factory };

        entries.insert(tenant.clone(), entry.clone());

        info!(
            tenant = %tenant,
            dialect = entry.engine.dialect().as_str(),
            "Registered tenant engine"
        );

        Ok(entry)
    }

    /// Eagerly register every configured tenant
    pub fn initialize_all(&self) -> Result<()> {
        for tenant in self.directory.ids() {
            self.ensure(tenant)?;
        }
        Ok(())
    }

    pub fn get(&self, tenant: &TenantId) -> Option<TenantEntry> {
        self.entries.lock().get(tenant).cloned()
    }

    pub fn is_initialized(&self, tenant: &TenantId) -> bool {
        self.entries.lock().contains_key(tenant)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn tenants(&self) -> Vec<TenantId> {
        let mut tenants: Vec<_> = self.entries.lock().keys().cloned().collect();
        tenants.sort();
        tenants
    }

    /// Snapshot of all entries, taken without holding the lock afterwards
    pub fn entries(&self) -> Vec<TenantEntry> {
        self.entries.lock().values().cloned().collect()
    }

    /// Run create-if-missing DDL against one tenant database
    pub async fn schema_sync(&self, tenant: &TenantId, schema: &dyn SchemaSource) -> Result<()> {
        let entry = self
            .get(tenant)
            .ok_or_else(|| TenantError::NotInitialized(tenant.to_string()))?;
        let dialect = entry.engine.dialect();

        let mut conn = entry.engine.pool().acquire().await.map_err(|source| {
            error!(tenant = %tenant, error = %source, "Schema sync could not connect");
            TenantError::Connection {
                tenant: tenant.to_string(),
                source,
            }
        })?;

        let statements = schema.statements(dialect);
        for statement in &statements {
            conn.execute(statement.as_str()).await.map_err(|source| {
                error!(tenant = %tenant, error = %source, "Schema statement failed");
                TenantError::Schema {
                    tenant: tenant.to_string(),
                    source,
                }
            })?;
        }

        debug!(
            tenant = %tenant,
            statements = statements.len(),
            "Schema synchronized"
        );

        Ok(())
    }

    /// Synchronize the schema of every configured tenant
    pub async fn sync_all(&self, schema: &dyn SchemaSource) -> Result<()> {
        let tenants: Vec<TenantId> = self.directory.ids().cloned().collect();
        for tenant in &tenants {
            self.ensure(tenant)?;
            self.schema_sync(tenant, schema).await?;
        }
        info!(tenants = tenants.len(), "Tenant schemas synchronized");
        Ok(())
    }

    /// Close every pool, waiting for checked-out connections to come back
    pub async fn close_all(&self) {
        for entry in self.entries() {
            entry.engine.pool().close().await;
            debug!(tenant = %entry.engine.tenant(), "Closed tenant pool");
        }
    }
}
