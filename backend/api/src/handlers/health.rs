use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    engine_version: &'static str,
    active_leads: i64,
    quarantined_leads: i64,
}

pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let mut conn = state.store.pool().acquire().await.map_err(|e| ApiError::from(flx_store::StoreError::from(e)))?;
    let active_leads = flx_store::lead::count_active(&mut conn).await.map_err(ApiError::from)?;
    let quarantined_leads = flx_store::quarantine::list_all(&mut conn).await.map_err(ApiError::from)?.len() as i64;

    Ok(Json(HealthResponse {
        status: "ok",
        engine_version: env!("CARGO_PKG_VERSION"),
        active_leads,
        quarantined_leads,
    }))
}
