//! Tenant panel: current tenant, configured tenants, explicit selection

use axum::{extract::State, Extension, Json};
use axum_extra::extract::cookie::CookieJar;
use roster_tenant::{ResolutionSource, TenantError, TenantId, TenantSummary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::rest::middleware::tenant_cookie;
use crate::{ApiResult, AppState, TenantContext};

#[derive(Debug, Serialize)]
pub struct TenantInfo {
    pub id: TenantId,
    pub display_name: String,
    pub source: ResolutionSource,
}

#[derive(Debug, Deserialize)]
pub struct SelectTenantRequest {
    pub tenant: String,
}

fn info_for(state: &AppState, tenant: &TenantId, source: ResolutionSource) -> TenantInfo {
    TenantInfo {
        id: tenant.clone(),
        display_name: state
            .directory()
            .display_name(tenant)
            .unwrap_or(tenant.as_str())
            .to_string(),
        source,
    }
}

pub async fn current_tenant(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
) -> Json<TenantInfo> {
    Json(info_for(&state, &ctx.tenant, ctx.source))
}

pub async fn list_tenants(State(state): State<Arc<AppState>>) -> Json<Vec<TenantSummary>> {
    Json(state.directory().summaries())
}

/// Make `tenant` the client's sticky tenant
pub async fn select_tenant(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<SelectTenantRequest>,
) -> ApiResult<(CookieJar, Json<TenantInfo>)> {
    let tenant = state
        .directory()
        .lookup(&request.tenant)
        .ok_or_else(|| TenantError::UnknownTenant(request.tenant.clone()))?;

    state.registry.ensure(&tenant)?;
    info!(tenant = %tenant, "Tenant selected");

    let jar = jar.add(tenant_cookie(&state.cookie_name, &tenant));
    Ok((jar, Json(info_for(&state, &tenant, ResolutionSource::Explicit))))
}
