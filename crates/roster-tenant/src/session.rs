//! Request-scoped database sessions
//!
//! A [`TenantSession`] is a pooled connection bound to one tenant, registered with
//! that tenant's [`SessionFactory`] while it is alive. Dropping the session removes it
//! from the factory, so release happens on success, on error and on unwind alike.
//! [`SessionProvider::teardown`] sweeps whatever a request left behind.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use sqlx::any::Any;
use sqlx::pool::PoolConnection;
use sqlx::{AnyConnection, Executor};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, MappedMutexGuard, MutexGuard};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::{ConnectionRegistry, Dialect, Result, TenantEngine, TenantError, TenantId};

/// One logical unit of work, usually one HTTP request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestScope(Uuid);

impl RequestScope {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestScope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The pooled connection of a live session, shared between the session and its factory.
/// Whoever empties the slot hands the connection back to the pool.
type ConnectionSlot = Arc<AsyncMutex<Option<PoolConnection<Any>>>>;

struct ActiveSession {
    scope: RequestScope,
    acquired_at: DateTime<Utc>,
    slot: ConnectionSlot,
}

impl std::fmt::Debug for ActiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveSession")
            .field("scope", &self.scope)
            .field("acquired_at", &self.acquired_at)
            .finish()
    }
}

/// Hands out sessions for one tenant and tracks the ones still alive
#[derive(Debug)]
pub struct SessionFactory {
    engine: Arc<TenantEngine>,
    active: Mutex<HashMap<SessionId, ActiveSession>>,
    next_id: AtomicU64,
}

impl SessionFactory {
    pub fn new(engine: Arc<TenantEngine>) -> Self {
        Self {
            engine,
            active: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn engine(&self) -> &Arc<TenantEngine> {
        &self.engine
    }

    pub fn tenant(&self) -> &TenantId {
        self.engine.tenant()
    }

    pub fn has_active_session(&self) -> bool {
        !self.active.lock().is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    pub fn active_in(&self, scope: RequestScope) -> usize {
        self.active
            .lock()
            .values()
            .filter(|session| session.scope == scope)
            .count()
    }

    /// Open a session: check out a connection, verify it answers, register it
    pub async fn open(self: &Arc<Self>, scope: RequestScope) -> Result<TenantSession> {
        let tenant = self.tenant();

        let mut conn = self.engine.pool().acquire().await.map_err(|source| {
            error!(tenant = %tenant, error = %source, "Failed to acquire tenant connection");
            TenantError::Connection {
                tenant: tenant.to_string(),
                source,
            }
        })?;

        if let Err(source) = conn.execute("SELECT 1").await {
            error!(tenant = %tenant, error = %source, "Tenant liveness check failed");
            return Err(TenantError::Connection {
                tenant: tenant.to_string(),
                source,
            });
        }

        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let slot: ConnectionSlot = Arc::new(AsyncMutex::new(Some(conn)));
        self.active.lock().insert(
            id,
            ActiveSession {
                scope,
                acquired_at: Utc::now(),
                slot: Arc::clone(&slot),
            },
        );

        debug!(tenant = %tenant, session_id = %id, scope = %scope, "Session opened");

        Ok(TenantSession {
            id,
            scope,
            factory: Arc::clone(self),
            slot,
        })
    }

    /// Remove a session from the active set; false when it was already gone
    pub fn release(&self, id: SessionId) -> bool {
        self.active.lock().remove(&id).is_some()
    }

    /// Release every session still registered under `scope` and return its
    /// connection to the pool
    pub fn sweep(&self, scope: RequestScope) -> usize {
        let leaked: Vec<(SessionId, ActiveSession)> = {
            let mut active = self.active.lock();
            let ids: Vec<SessionId> = active
                .iter()
                .filter(|(_, session)| session.scope == scope)
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| active.remove(&id).map(|session| (id, session)))
                .collect()
        };

        for (id, session) in &leaked {
            let held_ms = (Utc::now() - session.acquired_at).num_milliseconds();
            warn!(
                tenant = %self.tenant(),
                session_id = %id,
                scope = %scope,
                held_ms,
                "Releasing session left open at end of request"
            );

            match session.slot.try_lock() {
                Ok(mut slot) => drop(slot.take()),
                // Mid-statement; the connection goes back when the session is dropped
                Err(_) => warn!(
                    tenant = %self.tenant(),
                    session_id = %id,
                    "Swept session is in use, connection not reclaimed"
                ),
            }
        }

        leaked.len()
    }
}

/// A database session bound to exactly one tenant
pub struct TenantSession {
    id: SessionId,
    scope: RequestScope,
    factory: Arc<SessionFactory>,
    slot: ConnectionSlot,
}

impl TenantSession {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn scope(&self) -> RequestScope {
        self.scope
    }

    pub fn tenant(&self) -> &TenantId {
        self.factory.tenant()
    }

    pub fn dialect(&self) -> Dialect {
        self.factory.engine().dialect()
    }

    /// Borrow the connection; fails once the session has been swept.
    ///
    /// Transactions start from the borrowed connection and roll back unless committed.
    pub fn conn(&mut self) -> Result<MappedMutexGuard<'_, AnyConnection>> {
        let released = || TenantError::Released {
            tenant: self.tenant().to_string(),
            session: self.id.to_string(),
        };

        let slot = self.slot.try_lock().map_err(|_| released())?;
        MutexGuard::try_map(slot, |conn| conn.as_deref_mut()).map_err(|_| released())
    }

    /// Release explicitly; equivalent to dropping the session
    pub fn release(self) {}
}

impl std::fmt::Debug for TenantSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantSession")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("tenant", self.tenant())
            .finish()
    }
}

impl Drop for TenantSession {
    fn drop(&mut self) {
        if self.factory.release(self.id) {
            debug!(tenant = %self.tenant(), session_id = %self.id, "Session released");
        } else {
            debug!(
                tenant = %self.tenant(),
                session_id = %self.id,
                "Session was already swept"
            );
        }
    }
}

/// Gives out tenant sessions for a unit of work
#[derive(Debug, Clone)]
pub struct SessionProvider {
    registry: Arc<ConnectionRegistry>,
}

impl SessionProvider {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Acquire a session for a tenant whose registry entry already exists
    pub async fn acquire(&self, tenant: &TenantId, scope: RequestScope) -> Result<TenantSession> {
        let entry = self
            .registry
            .get(tenant)
            .ok_or_else(|| TenantError::NotInitialized(tenant.to_string()))?;

        entry.factory.open(scope).await
    }

    /// Run `work` with a session that is released however `work` ends
    pub async fn with_session<T, E, F>(
        &self,
        tenant: &TenantId,
        scope: RequestScope,
        work: F,
    ) -> std::result::Result<T, E>
    where
        F: for<'s> FnOnce(&'s mut TenantSession) -> BoxFuture<'s, std::result::Result<T, E>>,
        E: From<TenantError>,
    {
        let mut session = self.acquire(tenant, scope).await?;
        let outcome = work(&mut session).await;
        session.release();
        outcome
    }

    /// End-of-request safety net: release anything `scope` left registered
    pub fn teardown(&self, scope: RequestScope) -> usize {
        self.registry
            .entries()
            .iter()
            .map(|entry| entry.factory.sweep(scope))
            .sum()
    }
}
