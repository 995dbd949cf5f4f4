use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use flx_store::lead::{DocumentType, Lead, LeadStage};
use flx_store::quarantine;

use crate::error::LifecycleResult;

pub const REASON_GHOST_ZERO_VALUE: &str = "VERTEX_GHOST_ZERO_VALUE";
pub const REASON_DEBT_ONLY_NO_SURPLUS: &str = "PORTAL_DEBT_ONLY_NO_SURPLUS";

/// Pre-sale/continuance notices that slipped through extraction with a
/// near-zero confidence score and no surplus, named for the Vertex county
/// portal where this pattern was first observed. A final sale record with
/// the same low-confidence/zero-surplus shape is a genuine extraction
/// failure, not expected noise, so it must not match this rule.
fn is_ghost_zero_value(lead: &Lead) -> bool {
    lead.confidence_score <= 0.15
        && lead.surplus_amount_cents == 0
        && lead.document_type().ok() == Some(DocumentType::PreSaleNotice)
}

/// Portal-style counties that only ever publish the outstanding debt, never
/// a surplus figure, and so produce leads that can never clear review.
fn is_debt_only_no_surplus(lead: &Lead) -> bool {
    lead.total_debt_cents.is_some() && lead.winning_bid_cents.is_none() && lead.estimated_surplus_cents.is_none() && lead.surplus_amount_cents == 0
}

fn reason_for(lead: &Lead) -> Option<&'static str> {
    if is_ghost_zero_value(lead) {
        Some(REASON_GHOST_ZERO_VALUE)
    } else if is_debt_only_no_surplus(lead) {
        Some(REASON_DEBT_ONLY_NO_SURPLUS)
    } else {
        None
    }
}

/// One lead's worth of the sweep, callable per-row from the batch driver so
/// a single bad row can't abort the whole pass.
pub async fn sweep_one(conn: &mut SqliteConnection, lead: &Lead, now: DateTime<Utc>) -> LifecycleResult<bool> {
    if lead.stage().ok() == Some(LeadStage::Quarantined) {
        return Ok(false);
    }
    match reason_for(lead) {
        Some(reason) => {
            quarantine::quarantine(conn, lead, reason, now).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flx_store::lead::{DataGrade, NewLeadFields, UpsertOutcome};
    use flx_store::{lead, Store};

    async fn seed(store: &Store, fields: NewLeadFields) -> Lead {
        let outcome = store.write_tx(|conn| Box::pin(lead::upsert(conn, fields.clone(), Utc::now()))).await.unwrap();
        match outcome {
            UpsertOutcome::Inserted(l) | UpsertOutcome::Updated(l) => l,
        }
    }

    #[tokio::test]
    async fn ghost_zero_value_lead_is_quarantined() {
        let store = Store::open_in_memory().await.unwrap();
        let fields = NewLeadFields {
            county: Some("Vertex".into()),
            case_number: Some("V-1".into()),
            confidence_score: 0.1,
            data_grade: DataGrade::Iron,
            record_hash: "hash-ghost".into(),
            source_hash: "src-1".into(),
            parser_name: "generic".into(),
            document_type: flx_store::lead::DocumentType::PreSaleNotice,
            ..Default::default()
        };
        let lead = seed(&store, fields).await;

        let quarantined = store.write_tx(|conn| Box::pin(sweep_one(conn, &lead, Utc::now()))).await.unwrap();
        assert!(quarantined);

        let mut conn = store.pool().acquire().await.unwrap();
        assert!(quarantine::is_quarantined(&mut conn, &lead.id).await.unwrap());
    }

    #[tokio::test]
    async fn low_confidence_zero_surplus_sale_result_is_not_quarantined() {
        let store = Store::open_in_memory().await.unwrap();
        let fields = NewLeadFields {
            county: Some("Vertex".into()),
            case_number: Some("V-2".into()),
            confidence_score: 0.1,
            data_grade: DataGrade::Iron,
            record_hash: "hash-ghost-final".into(),
            source_hash: "src-1b".into(),
            parser_name: "generic".into(),
            document_type: flx_store::lead::DocumentType::SaleResult,
            ..Default::default()
        };
        let lead = seed(&store, fields).await;

        let quarantined = store.write_tx(|conn| Box::pin(sweep_one(conn, &lead, Utc::now()))).await.unwrap();
        assert!(!quarantined, "a garbled final sale record is an extraction failure, not ghost noise");
    }

    #[tokio::test]
    async fn debt_only_county_with_no_surplus_is_quarantined() {
        let store = Store::open_in_memory().await.unwrap();
        let fields = NewLeadFields {
            county: Some("Portal".into()),
            case_number: Some("P-1".into()),
            total_debt_cents: Some(100_000_00),
            confidence_score: 0.5,
            data_grade: DataGrade::Iron,
            record_hash: "hash-debt".into(),
            source_hash: "src-2".into(),
            parser_name: "generic".into(),
            ..Default::default()
        };
        let lead = seed(&store, fields).await;

        let quarantined = store.write_tx(|conn| Box::pin(sweep_one(conn, &lead, Utc::now()))).await.unwrap();
        assert!(quarantined);
    }

    #[tokio::test]
    async fn healthy_lead_is_left_alone() {
        let store = Store::open_in_memory().await.unwrap();
        let fields = NewLeadFields {
            county: Some("Jefferson".into()),
            case_number: Some("J-1".into()),
            winning_bid_cents: Some(150_000_00),
            total_debt_cents: Some(100_000_00),
            confidence_score: 0.9,
            data_grade: DataGrade::Gold,
            record_hash: "hash-healthy".into(),
            source_hash: "src-3".into(),
            parser_name: "generic".into(),
            ..Default::default()
        };
        let lead = seed(&store, fields).await;

        let quarantined = store.write_tx(|conn| Box::pin(sweep_one(conn, &lead, Utc::now()))).await.unwrap();
        assert!(!quarantined);
    }
}
