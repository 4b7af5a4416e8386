use axum::{extract::State, Extension, Json};
use roster_infra::users;
use roster_security::AccessToken;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::open_session;
use crate::{ApiError, ApiResult, AppState, TenantContext};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

fn rejected() -> ApiError {
    ApiError::Unauthorized("invalid username or password".to_string())
}

/// Exchange admin credentials for a token bound to the request's tenant
pub async fn login(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<AccessToken>> {
    let mut session = open_session(&state, &ctx).await?;
    let user = users::find_by_username(&mut *session.conn()?, &request.username).await?;
    session.release();

    let Some(user) = user else {
        warn!(tenant = %ctx.tenant, username = %request.username, "Login for unknown user");
        return Err(rejected());
    };

    if !state
        .passwords
        .verify_password(&request.password, &user.password_hash)?
    {
        warn!(tenant = %ctx.tenant, username = %user.username, "Login with wrong password");
        return Err(rejected());
    }

    let token = state
        .jwt
        .issue(user.id, &user.username, user.role, ctx.tenant.as_str())?;

    info!(tenant = %ctx.tenant, username = %user.username, "Admin logged in");
    Ok(Json(token))
}
