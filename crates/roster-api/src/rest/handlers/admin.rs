//! Admin user management

use axum::{extract::State, http::StatusCode, Extension, Json};
use roster_infra::{users, AdminUser};
use roster_security::{Permission, Role};
use serde::Deserialize;
use std::sync::Arc;

use super::open_session;
use crate::{ApiResult, AppState, AuthUser, TenantContext};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<AdminUser>>> {
    user.require(Permission::UsersManage)?;

    let mut session = open_session(&state, &ctx).await?;
    let body = users::list(&mut *session.conn()?).await?;
    Ok(Json(body))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<AdminUser>)> {
    user.require(Permission::UsersManage)?;

    let hash = state.passwords.hash_password(&request.password)?;

    let mut session = open_session(&state, &ctx).await?;
    let created = users::create(&mut *session.conn()?, &request.username, &hash, request.role).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
