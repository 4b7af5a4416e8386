//! CSV downloads

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use chrono::NaiveDate;
use roster_infra::reports;
use roster_security::Permission;
use serde::Deserialize;
use std::sync::Arc;

use super::dues::{expected_dues, PeriodQuery};
use super::open_session;
use crate::{ApiResult, AppState, AuthUser, TenantContext};

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

fn csv_download(filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

pub async fn members_report(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Response> {
    user.require(Permission::ReportsExport)?;

    let mut session = open_session(&state, &ctx).await?;
    let body = reports::members_csv(&mut *session.conn()?).await?;
    Ok(csv_download(&format!("{}-members.csv", ctx.tenant), body))
}

pub async fn dues_report(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<Response> {
    user.require(Permission::ReportsExport)?;

    let period = query.period()?;
    let expected = expected_dues(&state, &ctx);
    let mut session = open_session(&state, &ctx).await?;
    let body = reports::dues_csv(&mut *session.conn()?, &period, expected).await?;
    Ok(csv_download(&format!("{}-dues-{}.csv", ctx.tenant, period), body))
}

pub async fn attendance_report(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
    Extension(user): Extension<AuthUser>,
    Query(range): Query<RangeQuery>,
) -> ApiResult<Response> {
    user.require(Permission::ReportsExport)?;

    let mut session = open_session(&state, &ctx).await?;
    let body = reports::attendance_csv(&mut *session.conn()?, range.from, range.to).await?;
    Ok(csv_download(
        &format!("{}-attendance-{}-{}.csv", ctx.tenant, range.from, range.to),
        body,
    ))
}
