use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use flx_store::lead::{DataGrade, Lead, LeadFilter, LeadStatus, Page};

use crate::error::ApiError;
use crate::models::{LeadListQuery, SafeLead};
use crate::state::AppState;

const DEFAULT_PAGE_LIMIT: i64 = 25;
const MAX_PAGE_LIMIT: i64 = 100;

pub(crate) fn to_filter_and_page(query: &LeadListQuery) -> Result<(LeadFilter, Page), ApiError> {
    let grade = query
        .grade
        .as_deref()
        .map(|g| g.to_uppercase().parse::<DataGrade>())
        .transpose()
        .map_err(|_| ApiError::BadRequest("unknown grade".to_string()))?;
    let filter = LeadFilter { county: query.county.clone(), grade, min_surplus_cents: query.min_surplus_cents };

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    let offset = query.offset.unwrap_or(0).max(0);
    Ok((filter, Page { offset, limit }))
}

#[derive(Serialize)]
pub struct RawLeadListResponse {
    pub leads: Vec<Lead>,
}

#[derive(Serialize)]
pub struct LeadListResponse {
    pub leads: Vec<SafeLead>,
}

pub async fn list_leads(State(state): State<AppState>, Query(query): Query<LeadListQuery>) -> Result<Json<LeadListResponse>, ApiError> {
    let (filter, page) = to_filter_and_page(&query)?;
    let mut conn = state.store.pool().acquire().await.map_err(|e| ApiError::from(flx_store::StoreError::from(e)))?;
    let rows = flx_store::lead::list(&mut conn, &filter, page).await.map_err(ApiError::from)?;
    let now = Utc::now();
    let leads = rows.iter().map(|lead| SafeLead::from_lead(lead, now, state.config.auth.restriction_months)).collect();
    Ok(Json(LeadListResponse { leads }))
}

pub async fn get_lead(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<SafeLead>, ApiError> {
    let mut conn = state.store.pool().acquire().await.map_err(|e| ApiError::from(flx_store::StoreError::from(e)))?;
    let lead = flx_store::lead::get(&mut conn, &id).await.map_err(ApiError::from)?;
    let now = Utc::now();
    Ok(Json(SafeLead::from_lead(&lead, now, state.config.auth.restriction_months)))
}

#[derive(Serialize)]
pub struct PreviewLead {
    #[serde(flatten)]
    pub safe: SafeLead,
    pub preview_key: String,
}

#[derive(Serialize)]
pub struct PreviewListResponse {
    pub leads: Vec<PreviewLead>,
}

/// Preview eligibility: non-quarantined (enforced by `list` already) and
/// not past its claim deadline. Re-checked here rather than cached, so a
/// lead that expires between cache refreshes drops out immediately.
fn is_preview_eligible(lead: &Lead, now: chrono::DateTime<Utc>, restriction_months: u32) -> bool {
    !matches!(lead.status(now, restriction_months), LeadStatus::Expired)
}

pub async fn preview_leads(State(state): State<AppState>, Query(query): Query<LeadListQuery>) -> Result<Json<PreviewListResponse>, ApiError> {
    let (filter, page) = to_filter_and_page(&query)?;
    let mut conn = state.store.pool().acquire().await.map_err(|e| ApiError::from(flx_store::StoreError::from(e)))?;
    let rows = flx_store::lead::list(&mut conn, &filter, page).await.map_err(ApiError::from)?;
    let now = Utc::now();
    let restriction_months = state.config.auth.restriction_months;

    let leads = rows
        .iter()
        .filter(|lead| is_preview_eligible(lead, now, restriction_months))
        .map(|lead| PreviewLead {
            safe: SafeLead::from_lead(lead, now, restriction_months),
            preview_key: flx_crypto::preview_key(state.config.auth.preview_hmac_secret.as_bytes(), &lead.id),
        })
        .collect();

    Ok(Json(PreviewListResponse { leads }))
}

/// Generates a small, non-PII text document for a preview key. Any failure
/// along the way -- key not in the cache, lead gone, lead no longer
/// eligible -- collapses to the same `NotFound`, so a client can't use
/// response differences as an oracle for which step failed.
pub async fn dossier_sample(State(state): State<AppState>, Path(key): Path<String>) -> Result<Response, ApiError> {
    let lead_id = state.preview_cache.lookup(&key).ok_or(ApiError::NotFound)?;
    let mut conn = state.store.pool().acquire().await.map_err(|_| ApiError::NotFound)?;
    let lead = flx_store::lead::get(&mut conn, &lead_id).await.map_err(|_| ApiError::NotFound)?;

    let now = Utc::now();
    let restriction_months = state.config.auth.restriction_months;
    if !is_preview_eligible(&lead, now, restriction_months) {
        return Err(ApiError::NotFound);
    }
    let expected_key = flx_crypto::preview_key(state.config.auth.preview_hmac_secret.as_bytes(), &lead.id);
    if expected_key != key {
        return Err(ApiError::NotFound);
    }

    let safe = SafeLead::from_lead(&lead, now, restriction_months);
    let body = format!(
        "FLEXION SAMPLE DOSSIER\n\nCounty: {}\nCity/Region: {}\nEstimated Surplus: ${}\nData Grade: {}\nStatus: {}\nDays Remaining: {}\n\nThis is a non-PII preview. Unlock the full record to view owner and case details.\n",
        safe.county.as_deref().unwrap_or("unknown"),
        safe.city_hint.as_deref().unwrap_or("unknown"),
        safe.surplus_amount,
        safe.data_grade,
        safe.status,
        safe.days_remaining.map(|d| d.to_string()).unwrap_or_else(|| "n/a".to_string()),
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8")),
            (header::CONTENT_DISPOSITION, HeaderValue::from_static("attachment; filename=\"sample-dossier.txt\"")),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
        body,
    )
        .into_response())
}
