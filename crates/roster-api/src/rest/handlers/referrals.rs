use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use roster_core::{Referral, ReferralStatus};
use roster_infra::referrals::{self, StatusChange};
use roster_security::Permission;
use serde::Deserialize;
use std::sync::Arc;

use super::open_session;
use crate::{ApiError, ApiResult, AppState, AuthUser, TenantContext};

#[derive(Debug, Deserialize)]
pub struct ReferralQuery {
    pub status: Option<ReferralStatus>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: ReferralStatus,
}

pub async fn list_referrals(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ReferralQuery>,
) -> ApiResult<Json<Vec<Referral>>> {
    user.require(Permission::ReferralsRead)?;

    let mut session = open_session(&state, &ctx).await?;
    let body = referrals::list(&mut *session.conn()?, query.status).await?;
    Ok(Json(body))
}

pub async fn update_referral_status(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<Json<StatusChange>> {
    user.require(Permission::ReferralsWrite)?;

    let change = state
        .sessions
        .with_session(&ctx.tenant, ctx.scope, move |session| {
            Box::pin(async move {
                referrals::update_status(&mut *session.conn()?, id, update.status)
                    .await
                    .map_err(ApiError::from)
            })
        })
        .await?;

    Ok(Json(change))
}
