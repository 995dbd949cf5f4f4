use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;

use flx_api::config::{AppConfig, AuthConfig, MetricsConfig, PaymentMode, RateLimitingConfig, ServerConfig};
use flx_api::state::AppState;
use flx_store::lead::{DataGrade, NewLeadFields, UpsertOutcome};
use flx_store::Store;

fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig { host: "127.0.0.1".to_string(), port: 0 },
        store: flx_api::config::StoreConfig { path: ":memory:".to_string() },
        auth: AuthConfig {
            jwt_secret: "test-jwt-secret".to_string(),
            preview_hmac_secret: "test-preview-secret".to_string(),
            payment_webhook_secret: "test-webhook-secret".to_string(),
            payment_mode: PaymentMode::Test,
            founders_cap: 100,
            restriction_months: 6,
            claim_window_days: 180,
        },
        rate_limiting: RateLimitingConfig::default(),
        metrics: MetricsConfig::default(),
    }
}

async fn test_state() -> AppState {
    let store = Arc::new(Store::open_in_memory().await.unwrap());
    AppState::new(store, Arc::new(test_config()))
}

async fn seed_lead(state: &AppState, county: &str, case_number: &str, grade: DataGrade, surplus_cents: i64, hash: &str) -> String {
    let fields = NewLeadFields {
        county: Some(county.to_string()),
        case_number: Some(case_number.to_string()),
        owner_name: Some("Jane Homeowner".to_string()),
        property_address: Some(format!("123 Main St, {county}, CO 80401")),
        estimated_surplus_cents: Some(surplus_cents),
        confidence_score: 0.9,
        data_grade: grade,
        source_hash: hash.to_string(),
        parser_name: "generic".to_string(),
        record_hash: hash.to_string(),
        ..Default::default()
    };
    let now = Utc::now();
    let outcome = state.store.write_tx(|conn| Box::pin(flx_store::lead::upsert(conn, fields.clone(), now))).await.unwrap();
    let lead = match outcome {
        UpsertOutcome::Inserted(lead) => lead,
        UpsertOutcome::Updated(lead) => lead,
    };
    // surplus_amount_cents isn't set by NewLeadFields directly; bump it so the lead clears list/preview filters.
    sqlx::query("UPDATE leads SET surplus_amount_cents = ?, claim_deadline = ? WHERE id = ?")
        .bind(surplus_cents)
        .bind((now.date_naive() + chrono::Duration::days(90)).to_string())
        .bind(&lead.id)
        .execute(state.store.pool())
        .await
        .unwrap();
    lead.id
}

async fn register_and_login(state: &AppState, email: &str) -> (String, String) {
    let app = flx_api::build_router(state.clone());
    let register = Request::builder()
        .method("POST")
        .uri("/api/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"email": email, "password": "hunter22"}).to_string()))
        .unwrap();
    let resp = app.clone().oneshot(register).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap()).unwrap();
    let user_id = body["user_id"].as_str().unwrap().to_string();

    let login = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"email": email, "password": "hunter22"}).to_string()))
        .unwrap();
    let resp = app.oneshot(login).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap()).unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    (user_id, token)
}

#[tokio::test]
async fn health_reports_ok_with_no_leads() {
    let state = test_state().await;
    let app = flx_api::build_router(state);
    let resp = app.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["active_leads"], 0);
}

#[tokio::test]
async fn register_rejects_short_password() {
    let state = test_state().await;
    let app = flx_api::build_router(state);
    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"email": "a@example.com", "password": "short"}).to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_login_me_round_trip() {
    let state = test_state().await;
    let (user_id, token) = register_and_login(&state, "attorney@example.com").await;

    let app = flx_api::build_router(state);
    let req = Request::builder()
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["user_id"], user_id);
    assert_eq!(body["tier"], "scout");
    assert_eq!(body["email_verified"], false);
}

#[tokio::test]
async fn protected_route_without_bearer_is_rejected() {
    let state = test_state().await;
    let app = flx_api::build_router(state);
    let resp = app.oneshot(Request::builder().uri("/api/auth/me").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn list_leads_returns_safe_projection_without_owner_name() {
    let state = test_state().await;
    seed_lead(&state, "jefferson", "2025-CV-001", DataGrade::Gold, 50_000_00, "hash-list-1").await;

    let app = flx_api::build_router(state);
    let resp = app.oneshot(Request::builder().uri("/api/leads").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap()).unwrap();
    let leads = body["leads"].as_array().unwrap();
    assert_eq!(leads.len(), 1);
    assert!(leads[0].get("owner_name").is_none());
    assert_eq!(leads[0]["data_grade"], "GOLD");
}

#[tokio::test]
async fn list_leads_rejects_unknown_grade() {
    let state = test_state().await;
    let app = flx_api::build_router(state);
    let resp = app.oneshot(Request::builder().uri("/api/leads?grade=nonsense").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn preview_and_sample_dossier_round_trip() {
    let state = test_state().await;
    seed_lead(&state, "jefferson", "2025-CV-002", DataGrade::Silver, 30_000_00, "hash-preview-1").await;

    let app = flx_api::build_router(state);
    let resp = app.clone().oneshot(Request::builder().uri("/api/preview/leads").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap()).unwrap();
    let preview_key = body["leads"][0]["preview_key"].as_str().unwrap().to_string();

    let resp = app
        .oneshot(Request::builder().uri(format!("/api/dossier/sample/{preview_key}")).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8(body.to_vec()).unwrap().contains("FLEXION SAMPLE DOSSIER"));
}

#[tokio::test]
async fn sample_dossier_rejects_unknown_preview_key() {
    let state = test_state().await;
    let app = flx_api::build_router(state);
    let resp = app.oneshot(Request::builder().uri("/api/dossier/sample/deadbeef").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unlock_then_dossier_spends_credits_and_serves_full_record() {
    let state = test_state().await;
    let lead_id = seed_lead(&state, "jefferson", "2025-CV-003", DataGrade::Bronze, 12_000_00, "hash-unlock-1").await;
    let (user_id, token) = register_and_login(&state, "unlocker@example.com").await;

    sqlx::query("UPDATE users SET email_verified = 1 WHERE id = ?").bind(&user_id).execute(state.store.pool()).await.unwrap();
    sqlx::query("UPDATE wallets SET subscription_credits = 5 WHERE user_id = ?").bind(&user_id).execute(state.store.pool()).await.unwrap();

    let app = flx_api::build_router(state.clone());
    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/unlock/{lead_id}"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({}).to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["already_unlocked"], false);
    assert_eq!(body["credits_spent"], DataGrade::Bronze.credits_required());
    assert_eq!(body["lead"]["owner_name"], "Jane Homeowner");

    // second unlock of the same lead is free
    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/unlock/{lead_id}"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({}).to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let body: Value = serde_json::from_slice(&axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["already_unlocked"], true);
    assert_eq!(body["credits_spent"], 0);

    let req = Request::builder()
        .uri(format!("/api/dossier/{lead_id}"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8(body.to_vec()).unwrap().contains("FLEXION ATTORNEY DOSSIER"));
}

#[tokio::test]
async fn unlock_without_email_verification_is_forbidden() {
    let state = test_state().await;
    let lead_id = seed_lead(&state, "jefferson", "2025-CV-004", DataGrade::Iron, 8_000_00, "hash-unlock-2").await;
    let (_, token) = register_and_login(&state, "unverified@example.com").await;

    let app = flx_api::build_router(state);
    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/unlock/{lead_id}"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({}).to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_route_is_gated_on_is_admin_flag() {
    let state = test_state().await;
    seed_lead(&state, "jefferson", "2025-CV-005", DataGrade::Gold, 20_000_00, "hash-admin-1").await;
    let (user_id, token) = register_and_login(&state, "operator@example.com").await;

    let app = flx_api::build_router(state.clone());
    let req = Request::builder()
        .uri("/api/admin/leads")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    sqlx::query("UPDATE users SET is_admin = 1 WHERE id = ?").bind(&user_id).execute(state.store.pool()).await.unwrap();

    let req = Request::builder()
        .uri("/api/admin/leads")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn billing_webhook_activates_subscription_on_valid_signature() {
    let state = test_state().await;
    let (user_id, _) = register_and_login(&state, "subscriber@example.com").await;

    let payload = json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "client_reference_id": user_id,
                "subscription": "sub_123",
                "tier": "operator",
            }
        }
    })
    .to_string();
    let signature = flx_crypto::hmac_sha256_hex(b"test-webhook-secret", payload.as_bytes());

    let app = flx_api::build_router(state.clone());
    let req = Request::builder()
        .method("POST")
        .uri("/api/webhook")
        .header("stripe-signature", signature)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let mut conn = state.store.pool().acquire().await.unwrap();
    let user = flx_store::user::get_by_id(&mut conn, &user_id).await.unwrap();
    assert_eq!(user.tier, "operator");
    let wallet = flx_wallet::wallet::load_for_update(&mut conn, &user_id).await.unwrap();
    assert_eq!(wallet.subscription_credits, 100);
}

#[tokio::test]
async fn billing_webhook_rejects_bad_signature() {
    let state = test_state().await;
    let app = flx_api::build_router(state);
    let payload = json!({"id": "evt_2", "type": "checkout.session.completed", "data": {"object": {}}}).to_string();
    let req = Request::builder()
        .method("POST")
        .uri("/api/webhook")
        .header("stripe-signature", "not-a-real-signature")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_text_format() {
    let state = test_state().await;
    let app = flx_api::build_router(state);
    let resp = app.oneshot(Request::builder().uri("/api/metrics").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "text/plain; version=0.0.4");
}
