use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use flx_store::events::{self, EventType};
use flx_store::lead::{DataGrade, Lead};

use crate::error::LifecycleResult;

/// A GOLD lead that never picked up bid data and has no surplus left is
/// unsellable as-is; demoting it back to PIPELINE_STAGING lets a later
/// extraction pass re-promote it once real numbers show up, rather than
/// quarantining it outright.
fn should_demote(lead: &Lead) -> bool {
    lead.data_grade == DataGrade::Gold.as_str() && lead.winning_bid_cents.is_none() && lead.surplus_amount_cents == 0
}

pub async fn sweep_one(conn: &mut SqliteConnection, lead: &Lead, now: DateTime<Utc>) -> LifecycleResult<bool> {
    if !should_demote(lead) {
        return Ok(false);
    }

    let old_grade = lead.data_grade.clone();
    let new_grade = DataGrade::PipelineStaging.as_str();
    sqlx::query("UPDATE leads SET data_grade = ?, updated_at = ? WHERE id = ?")
        .bind(new_grade)
        .bind(now.to_rfc3339())
        .bind(&lead.id)
        .execute(&mut *conn)
        .await
        .map_err(flx_store::StoreError::from)?;

    events::record(conn, &lead.id, EventType::Demote, Some(&old_grade), Some(new_grade), "lifecycle-sweep", None, now).await?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flx_store::lead::{self, NewLeadFields, UpsertOutcome};
    use flx_store::Store;

    async fn seed(store: &Store, fields: NewLeadFields) -> Lead {
        let outcome = store.write_tx(|conn| Box::pin(lead::upsert(conn, fields.clone(), Utc::now()))).await.unwrap();
        match outcome {
            UpsertOutcome::Inserted(l) | UpsertOutcome::Updated(l) => l,
        }
    }

    #[tokio::test]
    async fn gold_lead_with_no_bid_and_no_surplus_is_demoted() {
        let store = Store::open_in_memory().await.unwrap();
        let fields = NewLeadFields {
            county: Some("Jefferson".into()),
            case_number: Some("J-2".into()),
            confidence_score: 0.9,
            data_grade: DataGrade::Gold,
            record_hash: "hash-demote".into(),
            source_hash: "src-1".into(),
            parser_name: "generic".into(),
            ..Default::default()
        };
        let lead = seed(&store, fields).await;
        assert_eq!(lead.surplus_amount_cents, 0);

        let demoted = store.write_tx(|conn| Box::pin(sweep_one(conn, &lead, Utc::now()))).await.unwrap();
        assert!(demoted);

        let refreshed = store.write_tx(|conn| Box::pin(lead::get(conn, &lead.id))).await.unwrap();
        assert_eq!(refreshed.data_grade, DataGrade::PipelineStaging.as_str());
    }

    #[tokio::test]
    async fn gold_lead_with_surplus_is_left_alone() {
        let store = Store::open_in_memory().await.unwrap();
        let fields = NewLeadFields {
            county: Some("Jefferson".into()),
            case_number: Some("J-3".into()),
            winning_bid_cents: Some(200_000_00),
            total_debt_cents: Some(100_000_00),
            confidence_score: 0.9,
            data_grade: DataGrade::Gold,
            record_hash: "hash-keep".into(),
            source_hash: "src-2".into(),
            parser_name: "generic".into(),
            ..Default::default()
        };
        let lead = seed(&store, fields).await;

        let demoted = store.write_tx(|conn| Box::pin(sweep_one(conn, &lead, Utc::now()))).await.unwrap();
        assert!(!demoted);
    }
}
