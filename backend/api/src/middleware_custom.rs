use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use flx_auth::gates::{apply_admin_simulation, Tier as GateTier, ADMIN_SIMULATION_HEADER};
use flx_auth::Subject;
use flx_store::user::AttorneyStatus;

use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

/// Verifies the bearer token, loads the subject's current store state
/// (deactivation, verification, quota counters), and inserts a `Subject`
/// into request extensions for handlers and gate functions to read. Runs
/// before route handlers but after the public endpoints have already
/// bypassed this layer (see the router split in `main.rs`).
pub async fn auth_middleware(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::AuthRequired)?;

    let now = Utc::now();
    let claims = state.tokens.verify(token, now).map_err(ApiError::from)?;

    let mut conn = state.store.pool().acquire().await.map_err(|e| ApiError::from(flx_store::StoreError::from(e)))?;
    let user = flx_store::user::get_by_id(&mut conn, &claims.sub).await.map_err(ApiError::from)?;
    if user.deactivated {
        return Err(ApiError::AuthRequired);
    }

    let tier: GateTier = user.tier().map_err(ApiError::from)?.as_str().parse().map_err(ApiError::from)?;
    let attorney_verified = user.attorney_status().map_err(ApiError::from)? == AttorneyStatus::Verified;
    let views_today = flx_store::views::count_today(&mut conn, &user.id, now).await.map_err(ApiError::from)?;
    let active_sessions = flx_store::session::count_active(&mut conn, &user.id, now).await.map_err(ApiError::from)?;

    let mut subject = Subject {
        user_id: user.id.clone(),
        tier,
        email_verified: user.email_verified,
        attorney_verified,
        bar_number: user.bar_number.clone(),
        is_admin: user.is_admin,
        deactivated: user.deactivated,
        views_today,
        active_sessions,
    };

    let simulate_non_admin = req.headers().contains_key(ADMIN_SIMULATION_HEADER);
    apply_admin_simulation(&mut subject, simulate_non_admin);

    req.extensions_mut().insert(subject);
    Ok(next.run(req).await)
}

/// `Vary` advertises the headers that change the response for a given path
/// (bearer token, admin-simulation header); `X-Content-Type-Options` guards
/// the document-download endpoints against content sniffing.
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        axum::http::header::VARY,
        HeaderValue::from_static("authorization, x-flexion-simulate-non-admin"),
    );
    headers.insert(HeaderName::from_static("x-content-type-options"), HeaderValue::from_static("nosniff"));
    response
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let route = req.uri().path().to_string();
    let start = Instant::now();
    let response = next.run(req).await;
    metrics::record_http_request(&route, response.status().as_u16(), start.elapsed());
    response
}
