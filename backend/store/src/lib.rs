//! Canonical persistence layer shared by every Flexion backend component.
//! A single WAL-mode SQLite file holds leads, provenance, the append-only
//! pipeline event log, quarantine, users, wallets, the transaction ledger,
//! and the statute/scraper reference tables. Downstream crates depend on
//! this one for entity types and never open their own connection to the
//! file.

pub mod error;
pub mod events;
pub mod lead;
pub mod pool;
pub mod quarantine;
pub mod registry;
pub mod session;
pub mod user;
pub mod verification;
pub mod views;

pub use error::{StoreError, StoreResult};
pub use pool::Store;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::{DataGrade, NewLeadFields, UpsertOutcome};
    use chrono::Utc;

    #[tokio::test]
    async fn open_in_memory_runs_migrations() {
        let store = Store::open_in_memory().await.unwrap();
        let mut conn = store.pool().acquire().await.unwrap();
        let leads = lead::list(&mut conn, &lead::LeadFilter::default(), lead::Page { offset: 0, limit: 10 })
            .await
            .unwrap();
        assert!(leads.is_empty());
    }

    #[tokio::test]
    async fn upsert_insert_then_merge_never_downgrades_grade() {
        let store = Store::open_in_memory().await.unwrap();
        let now = Utc::now();

        let first = NewLeadFields {
            county: Some("jefferson".to_string()),
            case_number: Some("2025-CV-001".to_string()),
            owner_name: Some("Jane Doe".to_string()),
            winning_bid_cents: Some(500_000),
            total_debt_cents: Some(300_000),
            confidence_score: 0.6,
            data_grade: DataGrade::Bronze,
            source_url: Some("https://example.gov/a".to_string()),
            source_hash: "hash-a".to_string(),
            parser_name: "generic".to_string(),
            record_hash: "rh-a".to_string(),
            ..Default::default()
        };

        let outcome = store
            .write_tx(|conn| Box::pin(lead::upsert(conn, first.clone(), now)))
            .await
            .unwrap();
        let inserted = match outcome {
            UpsertOutcome::Inserted(lead) => lead,
            UpsertOutcome::Updated(_) => panic!("expected insert"),
        };
        assert_eq!(inserted.data_grade, "BRONZE");

        let second = NewLeadFields {
            county: Some("jefferson".to_string()),
            case_number: Some("2025-CV-001".to_string()),
            confidence_score: 0.4,
            data_grade: DataGrade::Iron,
            source_url: Some("https://example.gov/b".to_string()),
            source_hash: "hash-b".to_string(),
            parser_name: "jefferson".to_string(),
            record_hash: "rh-b".to_string(),
            ..Default::default()
        };

        let outcome = store
            .write_tx(|conn| Box::pin(lead::upsert(conn, second.clone(), now)))
            .await
            .unwrap();
        let updated = match outcome {
            UpsertOutcome::Updated(lead) => lead,
            UpsertOutcome::Inserted(_) => panic!("expected update"),
        };
        // Iron < Bronze in rank, so the grade must not regress.
        assert_eq!(updated.data_grade, "BRONZE");
        assert_eq!(updated.id, inserted.id);
    }

    #[tokio::test]
    async fn quarantine_moves_lead_out_of_active_listing() {
        let store = Store::open_in_memory().await.unwrap();
        let now = Utc::now();
        let fields = NewLeadFields {
            county: Some("dade".to_string()),
            case_number: Some("2025-CV-999".to_string()),
            confidence_score: 0.9,
            data_grade: DataGrade::Gold,
            source_hash: "hash-c".to_string(),
            parser_name: "generic".to_string(),
            record_hash: "rh-c".to_string(),
            ..Default::default()
        };
        let outcome = store.write_tx(|conn| Box::pin(lead::upsert(conn, fields.clone(), now))).await.unwrap();
        let inserted = match outcome {
            UpsertOutcome::Inserted(lead) => lead,
            _ => panic!("expected insert"),
        };

        let mut conn = store.pool().acquire().await.unwrap();
        quarantine::quarantine(&mut conn, &inserted, "WHALE_CAP", now).await.unwrap();
        assert!(quarantine::is_quarantined(&mut conn, &inserted.id).await.unwrap());

        let active = lead::list(&mut conn, &lead::LeadFilter::default(), lead::Page { offset: 0, limit: 10 })
            .await
            .unwrap();
        assert!(active.iter().all(|l| l.id != inserted.id));
    }
}
