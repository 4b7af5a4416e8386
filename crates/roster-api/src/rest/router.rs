//! Axum router configuration

use crate::{
    rest::{handlers, middleware},
    AppState,
};
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::{sync::Arc, time::Duration};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    // Routes behind a bearer token
    let admin = Router::new()
        .route(
            "/members",
            get(handlers::list_members).post(handlers::create_member),
        )
        .route(
            "/members/:id",
            get(handlers::get_member)
                .put(handlers::update_member)
                .delete(handlers::delete_member),
        )
        .route(
            "/members/:id/dues",
            get(handlers::list_member_dues).post(handlers::record_dues),
        )
        .route("/members/:id/attendance", get(handlers::member_attendance))
        .route("/dues/status", get(handlers::dues_status))
        .route("/dues/:id", delete(handlers::delete_dues))
        .route(
            "/attendance",
            get(handlers::list_attendance).post(handlers::record_attendance),
        )
        .route("/referrals", get(handlers::list_referrals))
        .route("/referrals/:id/status", put(handlers::update_referral_status))
        .route(
            "/admin/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route("/reports/members.csv", get(handlers::members_report))
        .route("/reports/dues.csv", get(handlers::dues_report))
        .route("/reports/attendance.csv", get(handlers::attendance_report))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    // Tenant panel, login and member-facing forms
    let public = Router::new()
        .route("/tenant", get(handlers::current_tenant))
        .route("/tenant/select", post(handlers::select_tenant))
        .route("/tenants", get(handlers::list_tenants))
        .route("/auth/login", post(handlers::login))
        .route("/forms/referrals", post(handlers::submit_referral))
        .route("/forms/check-in", post(handlers::check_in));

    let health_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check));

    // The tenant middleware is outermost so auth sees the resolved tenant
    Router::new()
        .nest("/api/v1", public.merge(admin))
        .merge(health_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::tenant_middleware,
        ))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Configure CORS layer
fn cors_layer() -> CorsLayer {
    let origin = std::env::var("CORS_ALLOWED_ORIGIN")
        .ok()
        .and_then(|origin| origin.parse::<HeaderValue>().ok());

    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            middleware::X_TENANT.clone(),
        ])
        .max_age(Duration::from_secs(3600));

    // Credentials (the sticky cookie) are only allowed for a named origin
    match origin {
        Some(origin) => layer.allow_origin(origin).allow_credentials(true),
        None => layer,
    }
}
