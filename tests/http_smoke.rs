// Superfície HTTP sem banco: a pool é preguiçosa e nenhuma rota abaixo chega a usá-la.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use business_core::{
    config::AppState,
    models::{auth::User, rbac::SYSTEM_ADMIN_ROLE_ID},
    routes::build_router,
};
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "segredo-de-teste";

fn state() -> AppState {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unused")
        .unwrap();
    AppState::from_pool(pool, SECRET.into(), 1)
}

fn token_for(state: &AppState, role_id: Uuid, tenant_id: Option<Uuid>) -> String {
    let user = User {
        id: Uuid::new_v4(),
        username: "luis".into(),
        username_key: "luis".into(),
        password_hash: String::new(),
        role_id,
        subsidiary_id: Uuid::new_v4(),
        tenant_id,
        status: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    state.auth_service.create_token(&user).unwrap()
}

async fn send(app: Router, method: &str, uri: &str, token: Option<&str>) -> (StatusCode, serde_json::Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = request
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_is_public() {
    let app = build_router(state());
    let response = app
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn protected_routes_require_bearer() {
    let (status, body) = send(build_router(state()), "GET", "/api/users/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");

    let (status, _) = send(build_router(state()), "GET", "/api/roles", Some("nao.e.jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_from_another_secret_is_rejected() {
    let foreign = AppState::from_pool(
        PgPoolOptions::new().connect_lazy("postgres://localhost/unused").unwrap(),
        "outro-segredo".into(),
        1,
    );
    let token = token_for(&foreign, Uuid::new_v4(), Some(Uuid::new_v4()));

    let (status, _) = send(build_router(state()), "GET", "/api/users/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_echoes_token_identity() {
    let state = state();
    let tenant = Uuid::new_v4();
    let role = Uuid::new_v4();
    let token = token_for(&state, role, Some(tenant));

    let (status, body) = send(build_router(state), "GET", "/api/users/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["roleId"], role.to_string());
    assert_eq!(body["tenantId"], tenant.to_string());
    assert_eq!(body["username"], "luis");
}

#[tokio::test]
async fn system_admin_routes_reject_tenant_users() {
    let state = state();
    let token = token_for(&state, Uuid::new_v4(), Some(Uuid::new_v4()));

    for (method, uri) in [
        ("GET", "/api/tenants"),
        ("POST", "/api/tenants"),
        ("POST", "/api/catalog/sections"),
        ("PATCH", "/api/catalog/modules/00000000-0000-0000-0000-00000000000a/status"),
        ("DELETE", "/api/catalog/allowed-actions/00000000-0000-0000-0000-00000000000b"),
    ] {
        let (status, body) = send(build_router(state.clone()), method, uri, Some(&token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
        assert_eq!(body["error"], "forbidden");
    }
}

#[tokio::test]
async fn system_admin_passes_the_guard_and_reaches_validation() {
    let state = state();
    let token = token_for(&state, SYSTEM_ADMIN_ROLE_ID, None);

    // Passa pelo guardião; o payload vazio falha na validação antes de tocar o banco
    let (status, body) = send(build_router(state), "POST", "/api/catalog/allowed-actions", Some(&token)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = build_router(state());
    let response = app
        .oneshot(Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(doc["paths"]["/api/roles/{id}/sidebar"]["get"].is_object());
    assert!(doc["components"]["securitySchemes"]["api_jwt"].is_object());
}
