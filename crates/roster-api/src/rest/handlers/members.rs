use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use roster_core::{Member, MemberFilter, MemberForm};
use roster_infra::members;
use roster_security::Permission;
use std::sync::Arc;

use super::open_session;
use crate::{ApiResult, AppState, AuthUser, TenantContext};

pub async fn list_members(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
    Extension(user): Extension<AuthUser>,
    Query(filter): Query<MemberFilter>,
) -> ApiResult<Json<Vec<Member>>> {
    user.require(Permission::MembersRead)?;

    let mut session = open_session(&state, &ctx).await?;
    let body = members::list(&mut *session.conn()?, &filter).await?;
    Ok(Json(body))
}

pub async fn get_member(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Member>> {
    user.require(Permission::MembersRead)?;

    let mut session = open_session(&state, &ctx).await?;
    let body = members::get(&mut *session.conn()?, id).await?;
    Ok(Json(body))
}

pub async fn create_member(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
    Extension(user): Extension<AuthUser>,
    Json(form): Json<MemberForm>,
) -> ApiResult<(StatusCode, Json<Member>)> {
    user.require(Permission::MembersWrite)?;

    let mut session = open_session(&state, &ctx).await?;
    let member = members::create(&mut *session.conn()?, form).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn update_member(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(form): Json<MemberForm>,
) -> ApiResult<Json<Member>> {
    user.require(Permission::MembersWrite)?;

    let mut session = open_session(&state, &ctx).await?;
    let body = members::update(&mut *session.conn()?, id, form).await?;
    Ok(Json(body))
}

pub async fn delete_member(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    user.require(Permission::MembersWrite)?;

    let mut session = open_session(&state, &ctx).await?;
    members::delete(&mut *session.conn()?, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
