use std::time::Instant;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use chrono::Utc;

use flx_auth::Subject;
use flx_billing::{dispatch, verify, ProcessOutcome, WebhookEvent};

use crate::error::ApiError;
use crate::metrics;
use crate::models::{CheckoutRequest, CheckoutResponse};
use crate::state::AppState;

pub async fn checkout(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let checkout_url = state
        .payments
        .create_checkout_session(&subject.user_id, &body.tier)
        .await
        .map_err(|_| ApiError::BillingUnavailable)?;
    Ok(Json(CheckoutResponse { checkout_url }))
}

const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

/// Verifies the raw body against the configured webhook secret, then
/// dispatches through the idempotent ingest path. The whole handler is
/// meant to complete well inside the 10s webhook budget from the
/// concurrency model.
pub async fn webhook(State(state): State<AppState>, headers: HeaderMap, raw_body: axum::body::Bytes) -> Result<StatusCode, ApiError> {
    let start = Instant::now();
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("missing signature header".to_string()))?;

    verify::verify_signature(state.config.auth.payment_webhook_secret.as_bytes(), &raw_body, signature).map_err(ApiError::from)?;

    let event: WebhookEvent = serde_json::from_slice(&raw_body).map_err(|e| ApiError::BadRequest(format!("malformed webhook body: {e}")))?;

    let now = Utc::now();
    let founders_cap = state.config.auth.founders_cap;
    let outcome = state
        .store
        .write_tx(|conn| {
            let event = event.clone();
            Box::pin(async move { dispatch::process(conn, &event, founders_cap, now).await })
        })
        .await
        .map_err(ApiError::from)?;

    let outcome_label = match outcome {
        ProcessOutcome::Processed => "processed",
        ProcessOutcome::DuplicateIgnored => "duplicate_ignored",
    };
    metrics::record_webhook(outcome_label, start.elapsed());

    Ok(StatusCode::OK)
}
