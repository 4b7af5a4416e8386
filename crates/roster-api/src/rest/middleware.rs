//! Tenant and authentication middleware
//!
//! The tenant middleware wraps every route: it resolves the tenant, hands the
//! handler a [`TenantContext`], keeps the sticky cookie current and sweeps the
//! request's sessions once the handler is done.

use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderMap, HeaderName, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    extract::cookie::{Cookie, CookieJar, SameSite},
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use roster_security::{Claims, Permission, Role};
use roster_tenant::{RequestScope, ResolutionInput, ResolutionSource, TenantId};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info_span, Instrument};

use crate::{ApiError, ApiResult, AppState};

/// Explicit tenant override header
pub static X_TENANT: HeaderName = HeaderName::from_static("x-tenant");

/// Host as seen by the client when behind a proxy
pub static X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// Resolved tenant of the current request
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant: TenantId,
    pub scope: RequestScope,
    pub source: ResolutionSource,
}

/// Authenticated admin user of the current request
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub claims: Claims,
}

impl AuthUser {
    pub fn role(&self) -> Role {
        self.claims.role
    }

    pub fn username(&self) -> &str {
        &self.claims.username
    }

    pub fn require(&self, permission: Permission) -> ApiResult<()> {
        Ok(self.claims.role.require(permission)?)
    }
}

#[derive(Debug, Deserialize)]
struct TenantQuery {
    tenant: Option<String>,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Collect the tenant selection inputs of a request
pub fn resolution_input(
    headers: &HeaderMap,
    uri: &Uri,
    jar: &CookieJar,
    cookie_name: &str,
) -> ResolutionInput {
    let explicit = header_str(headers, &X_TENANT).map(str::to_string).or_else(|| {
        Query::<TenantQuery>::try_from_uri(uri)
            .ok()
            .and_then(|Query(query)| query.tenant)
    });

    // X-Forwarded-Host may carry a list; the first entry is the client's
    let host = header_str(headers, &X_FORWARDED_HOST)
        .and_then(|value| value.split(',').next())
        .or_else(|| header_str(headers, &header::HOST))
        .or_else(|| uri.host())
        .map(|host| host.trim().to_string());

    ResolutionInput {
        sticky: jar.get(cookie_name).map(|cookie| cookie.value().to_string()),
        explicit,
        host,
    }
}

/// Sticky tenant cookie
pub fn tenant_cookie(name: &str, tenant: &TenantId) -> Cookie<'static> {
    Cookie::build((name.to_string(), tenant.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn sets_cookie(response: &Response, name: &str) -> bool {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.starts_with(&prefix))
}

pub async fn tenant_middleware(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let input = resolution_input(request.headers(), request.uri(), &jar, &state.cookie_name);

    let resolution = match state.resolver.resolve(&input) {
        Ok(resolution) => resolution,
        Err(err) => return ApiError::from(err).into_response(),
    };

    if let Err(err) = state.registry.ensure(&resolution.tenant) {
        return ApiError::from(err).into_response();
    }

    let scope = RequestScope::new();
    request.extensions_mut().insert(TenantContext {
        tenant: resolution.tenant.clone(),
        scope,
        source: resolution.source,
    });

    let span = info_span!("tenant_request", tenant = %resolution.tenant, scope = %scope);
    let response = next.run(request).instrument(span).await;

    state.sessions.teardown(scope);

    // A handler that chose a tenant explicitly has already written the cookie
    if resolution.persist && !sets_cookie(&response, &state.cookie_name) {
        let jar = jar.add(tenant_cookie(&state.cookie_name, &resolution.tenant));
        return (jar, response).into_response();
    }

    response
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let TypedHeader(Authorization(bearer)) =
        bearer.ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

    let context = request
        .extensions()
        .get::<TenantContext>()
        .cloned()
        .ok_or_else(|| ApiError::Internal("tenant context missing".to_string()))?;

    let claims = state
        .jwt
        .validate_for_tenant(bearer.token(), context.tenant.as_str())?;

    debug!(
        tenant = %context.tenant,
        username = %claims.username,
        role = %claims.role,
        "Authenticated request"
    );

    request.extensions_mut().insert(AuthUser { claims });
    Ok(next.run(request).await)
}
