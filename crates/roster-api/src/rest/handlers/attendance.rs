use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use roster_core::{AttendanceForm, AttendanceRecord, AttendanceSummary};
use roster_infra::attendance;
use roster_security::Permission;
use serde::Deserialize;
use std::sync::Arc;

use super::open_session;
use crate::{ApiResult, AppState, AuthUser, TenantContext};

#[derive(Debug, Deserialize)]
pub struct MeetingQuery {
    pub date: NaiveDate,
}

pub async fn record_attendance(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
    Extension(user): Extension<AuthUser>,
    Json(form): Json<AttendanceForm>,
) -> ApiResult<(StatusCode, Json<AttendanceRecord>)> {
    user.require(Permission::AttendanceWrite)?;

    let mut session = open_session(&state, &ctx).await?;
    let record = attendance::record(&mut *session.conn()?, &form).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_attendance(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<MeetingQuery>,
) -> ApiResult<Json<Vec<AttendanceRecord>>> {
    user.require(Permission::AttendanceRead)?;

    let mut session = open_session(&state, &ctx).await?;
    let body = attendance::list_by_date(&mut *session.conn()?, query.date).await?;
    Ok(Json(body))
}

pub async fn member_attendance(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
    Extension(user): Extension<AuthUser>,
    Path(member_id): Path<i64>,
) -> ApiResult<Json<AttendanceSummary>> {
    user.require(Permission::AttendanceRead)?;

    let mut session = open_session(&state, &ctx).await?;
    let body = attendance::summary_for_member(&mut *session.conn()?, member_id).await?;
    Ok(Json(body))
}
