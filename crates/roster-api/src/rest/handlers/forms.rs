//! Member-facing forms, no login required

use axum::{extract::State, http::StatusCode, Extension, Json};
use roster_core::{AttendanceRecord, CheckInForm, Referral, ReferralForm};
use roster_infra::{attendance, referrals};
use std::sync::Arc;

use super::open_session;
use crate::{ApiResult, AppState, TenantContext};

pub async fn submit_referral(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
    Json(form): Json<ReferralForm>,
) -> ApiResult<(StatusCode, Json<Referral>)> {
    let mut session = open_session(&state, &ctx).await?;
    let referral = referrals::submit(&mut *session.conn()?, form).await?;
    Ok((StatusCode::CREATED, Json(referral)))
}

pub async fn check_in(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
    Json(form): Json<CheckInForm>,
) -> ApiResult<(StatusCode, Json<AttendanceRecord>)> {
    let mut session = open_session(&state, &ctx).await?;
    let record = attendance::check_in(&mut *session.conn()?, form).await?;
    Ok((StatusCode::CREATED, Json(record)))
}
