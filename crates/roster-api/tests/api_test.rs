//! HTTP-level tests: tenant routing, cookies, auth and handlers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use roster_api::{create_router, AppState};
use roster_core::{DatabaseConfig, TenancyConfig, TenantSettings};
use roster_infra::{users, TenantSchema};
use roster_security::{JwtManager, PasswordConfig, PasswordManager, Role};
use roster_tenant::{ConnectionRegistry, RequestScope, TenantDirectory, TenantId};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const PASSWORD: &str = "chapter-secret-42";

struct TestApp {
    router: Router,
    registry: Arc<ConnectionRegistry>,
}

fn memory_url(tenant: &str) -> String {
    format!(
        "sqlite:file:api-{}-{}?mode=memory&cache=shared",
        tenant,
        uuid::Uuid::new_v4()
    )
}

fn passwords() -> PasswordManager {
    PasswordManager::new(PasswordConfig {
        argon2_memory_cost: 4096,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
        ..Default::default()
    })
    .unwrap()
}

async fn seed_user(state: &AppState, tenant: &str, username: &str, role: Role) {
    let tenant = TenantId::parse(tenant).unwrap();
    let hash = state.passwords.hash_password(PASSWORD).unwrap();
    let mut session = state
        .sessions
        .acquire(&tenant, RequestScope::new())
        .await
        .unwrap();
    users::create(&mut *session.conn().unwrap(), username, &hash, role)
        .await
        .unwrap();
}

async fn test_app() -> TestApp {
    let tenancy = TenancyConfig::new("acme")
        .with_tenant(
            "acme",
            TenantSettings::new(&memory_url("acme"), "Acme Lodge").with_annual_dues(12000),
        )
        .with_tenant(
            "globex",
            TenantSettings::new(&memory_url("globex"), "Globex Chapter"),
        );
    let directory = Arc::new(TenantDirectory::from_config(&tenancy).unwrap());
    let registry = Arc::new(ConnectionRegistry::new(directory, DatabaseConfig::default()));
    registry.sync_all(&TenantSchema).await.unwrap();

    let state = AppState::new(
        registry.clone(),
        JwtManager::from_secret("api-test-secret"),
        passwords(),
        "roster_tenant",
    );
    seed_user(&state, "acme", "president", Role::Admin).await;
    seed_user(&state, "acme", "secretary", Role::Officer).await;
    seed_user(&state, "acme", "auditor", Role::Viewer).await;
    seed_user(&state, "globex", "president", Role::Admin).await;

    TestApp {
        router: create_router(state),
        registry,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn login(&self, host: &str, username: &str) -> String {
        let response = self
            .send(json_request(
                "POST",
                "/api/v1/auth/login",
                host,
                None,
                json!({ "username": username, "password": PASSWORD }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["access_token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    fn assert_no_active_sessions(&self) {
        for entry in self.registry.entries() {
            assert!(!entry.factory.has_active_session());
        }
    }
}

fn request(method: &str, uri: &str, host: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, host);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn json_request(
    method: &str,
    uri: &str,
    host: &str,
    token: Option<&str>,
    body: Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, host)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn set_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .map(|value| value.to_str().unwrap().to_string())
}

fn member_body(first: &str, last: &str, email: &str) -> Value {
    json!({
        "first_name": first,
        "last_name": last,
        "email": email,
        "phone": null,
        "joined_on": "2025-01-10",
        "notes": null
    })
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let response = app.send(request("GET", "/health", "localhost", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_ready_checks_resolved_tenant() {
    let app = test_app().await;
    let response = app
        .send(request("GET", "/ready", "globex.example.com", None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["tenant"], "globex");
    assert_eq!(body["dialect"], "sqlite");
    app.assert_no_active_sessions();
}

#[tokio::test]
async fn test_hostname_resolution_sets_sticky_cookie() {
    let app = test_app().await;
    let response = app
        .send(request("GET", "/api/v1/tenant", "globex.example.com", None))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response).unwrap();
    assert!(cookie.starts_with("roster_tenant=globex"));

    let body = body_json(response).await;
    assert_eq!(body["id"], "globex");
    assert_eq!(body["display_name"], "Globex Chapter");
    assert_eq!(body["source"], "hostname");
}

#[tokio::test]
async fn test_sticky_cookie_wins_over_hostname() {
    let app = test_app().await;
    let mut req = request("GET", "/api/v1/tenant", "globex.example.com", None);
    req.headers_mut()
        .insert(header::COOKIE, "roster_tenant=acme".parse().unwrap());

    let response = app.send(req).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).is_none());

    let body = body_json(response).await;
    assert_eq!(body["id"], "acme");
    assert_eq!(body["source"], "sticky");
}

#[tokio::test]
async fn test_unknown_explicit_tenant_is_rejected() {
    let app = test_app().await;
    let before = app.registry.len();

    let mut req = request("GET", "/api/v1/tenant", "localhost", None);
    req.headers_mut()
        .insert("x-tenant", "initech".parse().unwrap());
    let response = app.send(req).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNKNOWN_TENANT");
    assert_eq!(app.registry.len(), before);

    let response = app
        .send(request("GET", "/api/v1/tenant?tenant=initech", "localhost", None))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_default_tenant_without_hints() {
    let app = test_app().await;
    let response = app.send(request("GET", "/api/v1/tenant", "localhost", None)).await;
    let body = body_json(response).await;
    assert_eq!(body["id"], "acme");
    assert_eq!(body["source"], "default");
}

#[tokio::test]
async fn test_select_tenant_writes_cookie() {
    let app = test_app().await;
    let response = app
        .send(json_request(
            "POST",
            "/api/v1/tenant/select",
            "localhost",
            None,
            json!({ "tenant": "Globex" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookies: Vec<_> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("roster_tenant=globex"));

    let response = app
        .send(json_request(
            "POST",
            "/api/v1/tenant/select",
            "localhost",
            None,
            json!({ "tenant": "initech" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tenants_listing() {
    let app = test_app().await;
    let response = app.send(request("GET", "/api/v1/tenants", "localhost", None)).await;
    let body = body_json(response).await;
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["acme", "globex"]);
}

#[tokio::test]
async fn test_login_failures() {
    let app = test_app().await;

    let response = app
        .send(json_request(
            "POST",
            "/api/v1/auth/login",
            "acme.example.com",
            None,
            json!({ "username": "president", "password": "wrong-password-1" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .send(json_request(
            "POST",
            "/api/v1/auth/login",
            "acme.example.com",
            None,
            json!({ "username": "secretary-general", "password": PASSWORD }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    app.assert_no_active_sessions();
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let app = test_app().await;
    let response = app
        .send(request("GET", "/api/v1/members", "acme.example.com", None))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_token_is_not_valid_for_other_tenant() {
    let app = test_app().await;
    let token = app.login("acme.example.com", "president").await;

    let response = app
        .send(request("GET", "/api/v1/members", "acme.example.com", Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .send(request("GET", "/api/v1/members", "globex.example.com", Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_member_crud_is_tenant_scoped() {
    let app = test_app().await;
    let acme = app.login("acme.example.com", "secretary").await;
    let globex = app.login("globex.example.com", "president").await;

    let response = app
        .send(json_request(
            "POST",
            "/api/v1/members",
            "acme.example.com",
            Some(&acme),
            member_body("Ada", "Lovelace", "ada@example.com"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .send(json_request(
            "POST",
            "/api/v1/members",
            "acme.example.com",
            Some(&acme),
            member_body("Ada", "Again", "ada@example.com"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .send(json_request(
            "PUT",
            &format!("/api/v1/members/{}", id),
            "acme.example.com",
            Some(&acme),
            member_body("Ada", "King", "ada@example.com"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["last_name"], "King");

    // The other tenant's database never sees the member
    let response = app
        .send(request("GET", "/api/v1/members", "globex.example.com", Some(&globex)))
        .await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 0);

    let response = app
        .send(request(
            "DELETE",
            &format!("/api/v1/members/{}", id),
            "acme.example.com",
            Some(&acme),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .send(request(
            "GET",
            &format!("/api/v1/members/{}", id),
            "acme.example.com",
            Some(&acme),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    app.assert_no_active_sessions();
}

#[tokio::test]
async fn test_invalid_member_is_unprocessable() {
    let app = test_app().await;
    let token = app.login("acme.example.com", "secretary").await;

    let response = app
        .send(json_request(
            "POST",
            "/api/v1/members",
            "acme.example.com",
            Some(&token),
            member_body("Ada", "Lovelace", "not-an-email"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_member_without_phone_or_notes() {
    let app = test_app().await;
    let token = app.login("acme.example.com", "secretary").await;

    let response = app
        .send(json_request(
            "POST",
            "/api/v1/members",
            "acme.example.com",
            Some(&token),
            member_body("Ada", "Lovelace", "ada@example.com"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert!(created["phone"].is_null());
    assert!(created["notes"].is_null());

    let response = app
        .send(request(
            "GET",
            &format!("/api/v1/members/{}", created["id"]),
            "acme.example.com",
            Some(&token),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert!(fetched["phone"].is_null());
    assert!(fetched["notes"].is_null());

    let response = app
        .send(request("GET", "/api/v1/members", "acme.example.com", Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await[0]["phone"].is_null());
    app.assert_no_active_sessions();
}

#[tokio::test]
async fn test_viewer_cannot_write() {
    let app = test_app().await;
    let token = app.login("acme.example.com", "auditor").await;

    let response = app
        .send(json_request(
            "POST",
            "/api/v1/members",
            "acme.example.com",
            Some(&token),
            member_body("Ada", "Lovelace", "ada@example.com"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .send(request("GET", "/api/v1/members", "acme.example.com", Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_dues_and_reports() {
    let app = test_app().await;
    let officer = app.login("acme.example.com", "secretary").await;
    let admin = app.login("acme.example.com", "president").await;

    let response = app
        .send(json_request(
            "POST",
            "/api/v1/members",
            "acme.example.com",
            Some(&officer),
            member_body("Grace", "Hopper", "grace@example.com"),
        ))
        .await;
    let id = body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .send(json_request(
            "POST",
            &format!("/api/v1/members/{}/dues", id),
            "acme.example.com",
            Some(&officer),
            json!({
                "period": "2026",
                "amount_cents": 5000,
                "paid_on": "2026-01-20",
                "method": "card",
                "note": null
            }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .send(request(
            "GET",
            "/api/v1/dues/status?period=2026",
            "acme.example.com",
            Some(&officer),
        ))
        .await;
    let body = body_json(response).await;
    assert_eq!(body[0]["paid_cents"], 5000);
    assert_eq!(body[0]["expected_cents"], 12000);
    assert_eq!(body[0]["outstanding_cents"], 7000);

    // Officers keep records; exports are for admins
    let response = app
        .send(request(
            "GET",
            "/api/v1/reports/dues.csv?period=2026",
            "acme.example.com",
            Some(&officer),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .send(request(
            "GET",
            "/api/v1/reports/dues.csv?period=2026",
            "acme.example.com",
            Some(&admin),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"acme-dues-2026.csv\""
    );
    let csv = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(csv.starts_with("member_id,member_name,period,paid,expected,outstanding"));
    assert!(csv.contains("Grace Hopper,2026,50.00,120.00,70.00"));
}

#[tokio::test]
async fn test_malformed_period_is_unprocessable() {
    let app = test_app().await;
    let admin = app.login("acme.example.com", "president").await;

    for uri in [
        "/api/v1/reports/dues.csv?period=2026%0d%0aX-Injected:%201",
        "/api/v1/reports/dues.csv?period=2026%22",
        "/api/v1/dues/status?period=..%2F2026",
    ] {
        let response = app
            .send(request("GET", uri, "acme.example.com", Some(&admin)))
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{}", uri);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_FAILED");
    }
    app.assert_no_active_sessions();
}

#[tokio::test]
async fn test_member_forms_and_referral_conversion() {
    let app = test_app().await;
    let officer = app.login("acme.example.com", "secretary").await;

    app.send(json_request(
        "POST",
        "/api/v1/members",
        "acme.example.com",
        Some(&officer),
        member_body("Ada", "Lovelace", "ada@example.com"),
    ))
    .await;

    let response = app
        .send(json_request(
            "POST",
            "/api/v1/forms/check-in",
            "acme.example.com",
            None,
            json!({ "email": "ada@example.com", "meeting_date": "2026-05-06" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["status"], "present");

    let response = app
        .send(json_request(
            "POST",
            "/api/v1/forms/referrals",
            "acme.example.com",
            None,
            json!({
                "referrer_email": "ada@example.com",
                "candidate_name": "Charles Babbage",
                "candidate_email": "charles@example.com",
                "candidate_phone": null,
                "note": null
            }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let referral_id = body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .send(json_request(
            "PUT",
            &format!("/api/v1/referrals/{}/status", referral_id),
            "acme.example.com",
            Some(&officer),
            json!({ "status": "joined" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["referral"]["status"], "joined");
    assert_eq!(body["prospect"]["status"], "prospect");

    let response = app
        .send(request(
            "GET",
            "/api/v1/members?status=prospect",
            "acme.example.com",
            Some(&officer),
        ))
        .await;
    let prospects = body_json(response).await;
    assert_eq!(prospects.as_array().unwrap().len(), 1);
    assert_eq!(prospects[0]["email"], "charles@example.com");
    app.assert_no_active_sessions();
}

#[tokio::test]
async fn test_admin_user_management() {
    let app = test_app().await;
    let admin = app.login("acme.example.com", "president").await;
    let officer = app.login("acme.example.com", "secretary").await;

    let response = app
        .send(json_request(
            "POST",
            "/api/v1/admin/users",
            "acme.example.com",
            Some(&admin),
            json!({ "username": "treasurer", "password": "ledger-balance-7", "role": "officer" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["username"], "treasurer");
    assert!(body.get("password_hash").is_none());

    let response = app
        .send(json_request(
            "POST",
            "/api/v1/admin/users",
            "acme.example.com",
            Some(&admin),
            json!({ "username": "weak", "password": "short", "role": "viewer" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .send(request("GET", "/api/v1/admin/users", "acme.example.com", Some(&officer)))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .send(request("GET", "/api/v1/admin/users", "acme.example.com", Some(&admin)))
        .await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 4);
}
