use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{ApiError, ApiResult, AppState, TenantContext};

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Ready when the resolved tenant's database answers
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<Json<Value>> {
    let dialect = state
        .sessions
        .with_session(&ctx.tenant, ctx.scope, |session| {
            Box::pin(async move { Ok::<_, ApiError>(session.dialect()) })
        })
        .await?;

    Ok(Json(json!({
        "status": "ready",
        "tenant": ctx.tenant,
        "dialect": dialect.as_str(),
    })))
}
