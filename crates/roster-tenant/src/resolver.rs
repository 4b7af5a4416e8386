//! Tenant resolution
//!
//! Resolution order for one request:
//! 1. the sticky tenant stored in the client's session state, when still configured
//! 2. an explicit override (header or query parameter)
//! 3. the first label of the request hostname
//! 4. the configured default tenant

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::{Result, TenantDirectory, TenantError, TenantId};

/// Where a resolved tenant id came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    Sticky,
    Explicit,
    Hostname,
    Default,
}

impl ResolutionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sticky => "sticky",
            Self::Explicit => "explicit",
            Self::Hostname => "hostname",
            Self::Default => "default",
        }
    }
}

/// Raw tenant selection inputs taken from the request boundary
#[derive(Debug, Clone, Default)]
pub struct ResolutionInput {
    pub sticky: Option<String>,
    pub explicit: Option<String>,
    pub host: Option<String>,
}

impl ResolutionInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sticky(mut self, sticky: impl Into<String>) -> Self {
        self.sticky = Some(sticky.into());
        self
    }

    pub fn with_explicit(mut self, explicit: impl Into<String>) -> Self {
        self.explicit = Some(explicit.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }
}

/// Outcome of a successful resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub tenant: TenantId,
    pub source: ResolutionSource,
    /// The caller should store `tenant` as the client's sticky tenant
    pub persist: bool,
}

/// Maps request inputs to exactly one configured tenant
#[derive(Debug, Clone)]
pub struct TenantResolver {
    directory: Arc<TenantDirectory>,
}

impl TenantResolver {
    pub fn new(directory: Arc<TenantDirectory>) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &Arc<TenantDirectory> {
        &self.directory
    }

    pub fn resolve(&self, input: &ResolutionInput) -> Result<Resolution> {
        let sticky = input.sticky.as_deref().map(str::trim).filter(|s| !s.is_empty());

        if let Some(raw) = sticky {
            match self.directory.lookup(raw) {
                Some(tenant) => {
                    return Ok(Resolution {
                        persist: tenant.as_str() != raw,
                        tenant,
                        source: ResolutionSource::Sticky,
                    });
                }
                None => debug!(sticky = %raw, "Ignoring stale sticky tenant"),
            }
        }

        let (tenant, source) = if let Some(raw) = non_empty(input.explicit.as_deref()) {
            let tenant = self
                .directory
                .lookup(raw)
                .ok_or_else(|| TenantError::UnknownTenant(raw.to_string()))?;
            (tenant, ResolutionSource::Explicit)
        } else if let Some(tenant) = input.host.as_deref().and_then(|h| self.infer_from_host(h)) {
            (tenant, ResolutionSource::Hostname)
        } else {
            (self.directory.default_tenant().clone(), ResolutionSource::Default)
        };

        // Guards against a directory whose default drifted out of the set
        if !self.directory.contains(&tenant) {
            return Err(TenantError::UnknownTenant(tenant.to_string()));
        }

        let persist = sticky.map_or(true, |raw| raw != tenant.as_str());

        debug!(tenant = %tenant, source = source.as_str(), "Resolved tenant");

        Ok(Resolution {
            tenant,
            source,
            persist,
        })
    }

    /// Match `{tenant_key}.<domain>` against the configured keys
    pub fn infer_from_host(&self, host: &str) -> Option<TenantId> {
        let label = subdomain_label(host, self.directory.base_domain())?;
        self.directory.lookup(label)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Leftmost DNS label of `host` when it names a subdomain
fn subdomain_label<'a>(host: &'a str, base_domain: Option<&str>) -> Option<&'a str> {
    let host = host.trim();
    let host = host.rsplit_once(':').map_or(host, |(name, port)| {
        if port.chars().all(|c| c.is_ascii_digit()) {
            name
        } else {
            host
        }
    });
    let host = host.trim_end_matches('.');

    match base_domain {
        Some(base) => {
            let lower = host.to_ascii_lowercase();
            let prefix_len = lower.strip_suffix(base)?.strip_suffix('.')?.len();
            let label = &host[..prefix_len];
            (!label.is_empty() && !label.contains('.')).then_some(label)
        }
        None => {
            let (label, rest) = host.split_once('.')?;
            (!label.is_empty() && !rest.is_empty()).then_some(label)
        }
    }
}
