use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use crate::error::StoreResult;

/// Append-only audit trail. Every grade change, unlock, quarantine, demotion,
/// scraper run, and payment event gets a row here; nothing is ever updated
/// or deleted once written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    GradeChange,
    LeadUnlock,
    Quarantine,
    Demote,
    ScraperSuccess,
    ScraperError,
    PaymentEvent,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::GradeChange => "GRADE_CHANGE",
            EventType::LeadUnlock => "LEAD_UNLOCK",
            EventType::Quarantine => "QUARANTINE",
            EventType::Demote => "DEMOTE",
            EventType::ScraperSuccess => "SCRAPER_SUCCESS",
            EventType::ScraperError => "SCRAPER_ERROR",
            EventType::PaymentEvent => "PAYMENT_EVENT",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PipelineEvent {
    pub id: i64,
    pub target_id: String,
    #[sqlx(rename = "type")]
    pub event_type: String,
    pub old: Option<String>,
    pub new: Option<String>,
    pub actor: Option<String>,
    pub reason: Option<String>,
    pub created_at: String,
    pub meta: Option<String>,
}

#[allow(clippy::too_many_arguments)]
pub async fn record(
    conn: &mut SqliteConnection,
    target_id: &str,
    event_type: EventType,
    old: Option<&str>,
    new: Option<&str>,
    actor: &str,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO pipeline_events (target_id, type, old, new, actor, reason, created_at) VALUES (?,?,?,?,?,?,?)",
    )
    .bind(target_id)
    .bind(event_type.as_str())
    .bind(old)
    .bind(new)
    .bind(actor)
    .bind(reason)
    .bind(now.to_rfc3339())
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn record_with_meta(
    conn: &mut SqliteConnection,
    target_id: &str,
    event_type: EventType,
    old: Option<&str>,
    new: Option<&str>,
    actor: &str,
    reason: Option<&str>,
    meta: &serde_json::Value,
    now: DateTime<Utc>,
) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO pipeline_events (target_id, type, old, new, actor, reason, created_at, meta) VALUES (?,?,?,?,?,?,?,?)",
    )
    .bind(target_id)
    .bind(event_type.as_str())
    .bind(old)
    .bind(new)
    .bind(actor)
    .bind(reason)
    .bind(now.to_rfc3339())
    .bind(meta.to_string())
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn for_target(conn: &mut SqliteConnection, target_id: &str) -> StoreResult<Vec<PipelineEvent>> {
    Ok(
        sqlx::query_as::<_, PipelineEvent>("SELECT * FROM pipeline_events WHERE target_id = ? ORDER BY id ASC")
            .bind(target_id)
            .fetch_all(conn)
            .await?,
    )
}
