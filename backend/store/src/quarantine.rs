use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use crate::error::StoreResult;
use crate::lead::Lead;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuarantinedLead {
    pub id: String,
    pub lead_json: String,
    pub quarantine_reason: String,
    pub quarantined_at: String,
}

/// Pull a lead out of the active table entirely and park it in quarantine.
/// Used by the BS-detector sweep (WHALE_CAP / DATE_GLITCH / RATIO_TEST) and
/// by one-off manual takedowns.
pub async fn quarantine(conn: &mut SqliteConnection, lead: &Lead, reason: &str, now: DateTime<Utc>) -> StoreResult<()> {
    let lead_json = serde_json::to_string(lead).unwrap_or_default();
    sqlx::query("INSERT INTO quarantine_leads (id, lead_json, quarantine_reason, quarantined_at) VALUES (?,?,?,?)")
        .bind(&lead.id)
        .bind(&lead_json)
        .bind(reason)
        .bind(now.to_rfc3339())
        .execute(&mut *conn)
        .await?;
    sqlx::query("UPDATE leads SET status = 'QUARANTINED', updated_at = ? WHERE id = ?")
        .bind(now.to_rfc3339())
        .bind(&lead.id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn is_quarantined(conn: &mut SqliteConnection, lead_id: &str) -> StoreResult<bool> {
    let row: Option<(String,)> = sqlx::query_as("SELECT id FROM quarantine_leads WHERE id = ?")
        .bind(lead_id)
        .fetch_optional(conn)
        .await?;
    Ok(row.is_some())
}

pub async fn list_all(conn: &mut SqliteConnection) -> StoreResult<Vec<QuarantinedLead>> {
    Ok(
        sqlx::query_as::<_, QuarantinedLead>("SELECT * FROM quarantine_leads ORDER BY quarantined_at DESC")
            .fetch_all(conn)
            .await?,
    )
}
