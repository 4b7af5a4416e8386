//! Shared application state

use roster_security::{JwtManager, PasswordManager};
use roster_tenant::{ConnectionRegistry, SessionProvider, TenantDirectory, TenantResolver};
use std::sync::Arc;

/// State shared by every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub resolver: TenantResolver,
    pub registry: Arc<ConnectionRegistry>,
    pub sessions: SessionProvider,
    pub jwt: Arc<JwtManager>,
    pub passwords: Arc<PasswordManager>,
    /// Name of the sticky tenant cookie
    pub cookie_name: String,
}

impl AppState {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        jwt: JwtManager,
        passwords: PasswordManager,
        cookie_name: impl Into<String>,
    ) -> Self {
        Self {
            resolver: TenantResolver::new(registry.directory().clone()),
            sessions: SessionProvider::new(registry.clone()),
            registry,
            jwt: Arc::new(jwt),
            passwords: Arc::new(passwords),
            cookie_name: cookie_name.into(),
        }
    }

    pub fn directory(&self) -> &Arc<TenantDirectory> {
        self.registry.directory()
    }
}
