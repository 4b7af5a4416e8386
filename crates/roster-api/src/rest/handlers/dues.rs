use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{Datelike, Utc};
use roster_core::{DuesPayment, DuesPaymentForm, DuesStatus};
use roster_infra::dues;
use roster_security::Permission;
use serde::Deserialize;
use std::sync::Arc;

use super::open_session;
use crate::{ApiError, ApiResult, AppState, AuthUser, TenantContext};

const MAX_PERIOD_LEN: usize = 20;

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    /// Defaults to the current calendar year
    pub period: Option<String>,
}

impl PeriodQuery {
    /// The requested period, limited to letters, digits and dashes so it can
    /// appear in a download filename
    pub fn period(&self) -> ApiResult<String> {
        let period = match self.period.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => p,
            _ => return Ok(Utc::now().year().to_string()),
        };

        let well_formed = period.len() <= MAX_PERIOD_LEN
            && period
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !well_formed {
            return Err(ApiError::Validation(format!(
                "period must be at most {} letters, digits or dashes",
                MAX_PERIOD_LEN
            )));
        }
        Ok(period.to_string())
    }
}

/// Configured yearly dues of the request's tenant
pub(crate) fn expected_dues(state: &AppState, ctx: &TenantContext) -> i64 {
    state
        .directory()
        .get(&ctx.tenant)
        .map(|settings| settings.annual_dues_cents)
        .unwrap_or_default()
}

pub async fn list_member_dues(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
    Extension(user): Extension<AuthUser>,
    Path(member_id): Path<i64>,
) -> ApiResult<Json<Vec<DuesPayment>>> {
    user.require(Permission::DuesRead)?;

    let mut session = open_session(&state, &ctx).await?;
    let body = dues::list_for_member(&mut *session.conn()?, member_id).await?;
    Ok(Json(body))
}

pub async fn record_dues(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
    Extension(user): Extension<AuthUser>,
    Path(member_id): Path<i64>,
    Json(form): Json<DuesPaymentForm>,
) -> ApiResult<(StatusCode, Json<DuesPayment>)> {
    user.require(Permission::DuesWrite)?;

    let mut session = open_session(&state, &ctx).await?;
    let payment = dues::record(&mut *session.conn()?, member_id, form).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn delete_dues(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    user.require(Permission::DuesWrite)?;

    let mut session = open_session(&state, &ctx).await?;
    dues::delete(&mut *session.conn()?, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn dues_status(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<Json<Vec<DuesStatus>>> {
    user.require(Permission::DuesRead)?;

    let period = query.period()?;
    let expected = expected_dues(&state, &ctx);
    let mut session = open_session(&state, &ctx).await?;
    let body = dues::status(&mut *session.conn()?, &period, expected).await?;
    Ok(Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(period: Option<&str>) -> PeriodQuery {
        PeriodQuery {
            period: period.map(str::to_string),
        }
    }

    #[test]
    fn test_period_defaults_to_current_year() {
        let year = Utc::now().year().to_string();
        assert_eq!(query(None).period().unwrap(), year);
        assert_eq!(query(Some("  ")).period().unwrap(), year);
    }

    #[test]
    fn test_period_is_trimmed() {
        assert_eq!(query(Some(" 2026 ")).period().unwrap(), "2026");
        assert_eq!(query(Some("2026-H1")).period().unwrap(), "2026-H1");
    }

    #[test]
    fn test_period_rejects_unsafe_text() {
        for bad in ["2026\r\nSet-Cookie: x=1", "2026\"", "../2026", "2026 spring"] {
            assert!(matches!(
                query(Some(bad)).period(),
                Err(ApiError::Validation(_))
            ));
        }
        let long = "9".repeat(MAX_PERIOD_LEN + 1);
        assert!(query(Some(&long)).period().is_err());
    }
}
