use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::Utc;

use flx_auth::gates::{self};
use flx_auth::Subject;
use flx_store::lead::LeadStatus;
use flx_wallet::unlock::UnlockOutcome;

use crate::error::ApiError;
use crate::metrics;
use crate::models::{FullLead, UnlockRequest, UnlockResponse};
use crate::state::AppState;

/// Composes the gates from the HTTP surface table's `Auth+EmailVerified+tier+(maybe)Attorney`
/// column: email verification always required; attorney + operator-tier + disclaimer
/// only kick in when the target lead is in its restricted window.
pub async fn unlock_lead(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(id): Path<String>,
    Json(body): Json<UnlockRequest>,
) -> Result<Json<UnlockResponse>, ApiError> {
    gates::require_email_verified(&subject).map_err(ApiError::from)?;

    let restriction_months = state.config.auth.restriction_months;
    let now = Utc::now();

    {
        let mut conn = state.store.pool().acquire().await.map_err(|e| ApiError::from(flx_store::StoreError::from(e)))?;
        let target = flx_store::lead::get(&mut conn, &id).await.map_err(ApiError::from)?;
        if matches!(target.status(now, restriction_months), LeadStatus::Restricted) {
            gates::require_restricted_unlock(&subject, body.disclaimer_accepted).map_err(ApiError::from)?;
        }
    }

    let outcome = state
        .store
        .write_tx(|conn| {
            let id = id.clone();
            let user_id = subject.user_id.clone();
            let tier_label = subject.tier.label();
            Box::pin(async move { flx_wallet::unlock::unlock(conn, &user_id, &id, tier_label, None, restriction_months, now).await })
        })
        .await
        .map_err(ApiError::from)?;

    let (lead, credits_spent, already_unlocked) = match outcome {
        UnlockOutcome::Unlocked { lead, credits_spent } => (lead, credits_spent, false),
        UnlockOutcome::AlreadyUnlocked { lead } => (lead, 0, true),
    };

    if !already_unlocked {
        metrics::record_unlock(&lead.data_grade, credits_spent);
    }

    {
        let mut conn = state.store.pool().acquire().await.map_err(|e| ApiError::from(flx_store::StoreError::from(e)))?;
        flx_store::views::record(&mut conn, &subject.user_id, &lead.id, now).await.map_err(ApiError::from)?;
    }

    Ok(Json(UnlockResponse {
        lead: FullLead::from_lead(&lead, now, restriction_months),
        credits_spent,
        already_unlocked,
    }))
}

/// Full document stream for a lead the caller has already unlocked. Checked
/// against the `unlocks` table rather than re-running the unlock algorithm --
/// this endpoint never spends credits.
pub async fn dossier(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    gates::require_daily_view_quota(&subject).map_err(ApiError::from)?;

    let mut conn = state.store.pool().acquire().await.map_err(|e| ApiError::from(flx_store::StoreError::from(e)))?;
    let unlocked = flx_store::lead::is_unlocked_by(&mut conn, &subject.user_id, &id).await.map_err(ApiError::from)?;
    if !unlocked {
        return Err(ApiError::NotFound);
    }
    let lead = flx_store::lead::get(&mut conn, &id).await.map_err(ApiError::from)?;

    let now = Utc::now();
    flx_store::views::record(&mut conn, &subject.user_id, &lead.id, now).await.map_err(ApiError::from)?;

    let body = format!(
        "FLEXION ATTORNEY DOSSIER\n\nCase Number: {}\nCounty: {}\nOwner: {}\nProperty Address: {}\nWinning Bid: {}\nTotal Debt: {}\nSurplus: {}\nSale Date: {}\nClaim Deadline: {}\n",
        lead.case_number.as_deref().unwrap_or("unknown"),
        lead.county.as_deref().unwrap_or("unknown"),
        lead.owner_name.as_deref().unwrap_or("unknown"),
        lead.property_address.as_deref().unwrap_or("unknown"),
        lead.winning_bid_cents.map(|c| format!("${:.2}", c as f64 / 100.0)).unwrap_or_else(|| "unknown".to_string()),
        lead.total_debt_cents.map(|c| format!("${:.2}", c as f64 / 100.0)).unwrap_or_else(|| "unknown".to_string()),
        format!("${:.2}", lead.surplus_amount_cents as f64 / 100.0),
        lead.sale_date.as_deref().unwrap_or("unknown"),
        lead.claim_deadline.as_deref().unwrap_or("unknown"),
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8")),
            (header::CONTENT_DISPOSITION, HeaderValue::from_static("attachment; filename=\"dossier.txt\"")),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
        body,
    )
        .into_response())
}
