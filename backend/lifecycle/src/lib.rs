//! Batch re-scoring: completeness/decay, re-grading, the BS-detector, and
//! the quarantine/demotion sweeps that run over leads after they've already
//! been persisted once by the extraction engine. `status` itself is never
//! computed here -- it lives in `flx_store::lead::derive_status` and is
//! re-exported so callers don't reach into `flx-store` directly for it.

pub mod bs_detector;
pub mod completeness;
pub mod demotion_sweep;
pub mod error;
pub mod quarantine_sweep;
pub mod regrade;

pub use bs_detector::{detect as detect_bs_flags, BsFlag};
pub use completeness::{completeness, decayed_confidence};
pub use error::{LifecycleError, LifecycleResult};
pub use flx_store::lead::derive_status;
pub use regrade::regrade;

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use flx_store::lead::{DataGrade, Lead};

/// Outcome of a single lead's pass through the re-score pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescoreOutcome {
    pub lead_id: String,
    pub previous_grade: String,
    pub new_grade: DataGrade,
    pub bs_flags: Vec<&'static str>,
    pub quarantined: bool,
    pub demoted: bool,
}

/// Run the full periodic pipeline for one lead: completeness + decay feed the
/// re-grade matrix, BS-detector flags are recorded alongside (never
/// auto-quarantine on their own), then the quarantine sweep and demotion
/// sweep each get a chance to act. Quarantine wins if both conditions would
/// otherwise apply to the same lead.
pub async fn rescore_one(
    conn: &mut SqliteConnection,
    lead: &Lead,
    days_since_updated: i64,
    days_to_deadline: i64,
    now: DateTime<Utc>,
) -> LifecycleResult<RescoreOutcome> {
    let previous_grade = lead.data_grade.clone();
    let completeness_score = completeness::completeness(lead);
    let decayed = completeness::decayed_confidence(lead.confidence_score, days_since_updated);
    let new_grade = regrade::regrade(completeness_score, decayed, lead.surplus_amount_cents, days_to_deadline);

    let flags = bs_detector::detect(lead.surplus_amount_cents, lead.total_debt_cents);
    let bs_flags: Vec<&'static str> = flags.iter().map(|f| f.as_str()).collect();

    if new_grade != lead.grade().unwrap_or(DataGrade::Iron) {
        sqlx::query("UPDATE leads SET data_grade = ?, updated_at = ? WHERE id = ?")
            .bind(new_grade.as_str())
            .bind(now.to_rfc3339())
            .bind(&lead.id)
            .execute(&mut *conn)
            .await
            .map_err(flx_store::StoreError::from)?;
    }

    let quarantined = quarantine_sweep::sweep_one(conn, lead, now).await?;
    let demoted = if quarantined { false } else { demotion_sweep::sweep_one(conn, lead, now).await? };

    Ok(RescoreOutcome {
        lead_id: lead.id.clone(),
        previous_grade,
        new_grade,
        bs_flags,
        quarantined,
        demoted,
    })
}
