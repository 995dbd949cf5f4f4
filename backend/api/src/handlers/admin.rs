use axum::extract::{Query, State};
use axum::{Extension, Json};

use flx_auth::Subject;
use flx_store::lead::Lead;

use crate::error::ApiError;
use crate::handlers::leads::{to_filter_and_page, RawLeadListResponse};
use crate::models::LeadListQuery;
use crate::state::AppState;

/// Raw, unprojected lead listing for operators -- no `SafeLead` coarsening,
/// no status filtering. Gated on `subject.is_admin`, which the
/// admin-simulation header can strip for the duration of one request.
pub async fn list_all_leads(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Query(query): Query<LeadListQuery>,
) -> Result<Json<RawLeadListResponse>, ApiError> {
    if !subject.is_admin {
        return Err(ApiError::AuthRequired);
    }

    let (filter, page) = to_filter_and_page(&query)?;
    let mut conn = state.store.pool().acquire().await.map_err(|e| ApiError::from(flx_store::StoreError::from(e)))?;
    let leads: Vec<Lead> = flx_store::lead::list(&mut conn, &filter, page).await.map_err(ApiError::from)?;
    Ok(Json(RawLeadListResponse { leads }))
}
