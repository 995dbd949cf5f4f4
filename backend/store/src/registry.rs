use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::error::StoreResult;

/// Jurisdiction-specific surplus-funds statute metadata, looked up by the
/// lifecycle engine when computing claim deadlines and fee caps.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StatuteAuthority {
    pub jurisdiction: String,
    pub asset_type: String,
    pub statute_years: f64,
    pub triggering_event: String,
    pub citation: String,
    pub fee_cap_pct: Option<f64>,
    pub fee_cap_flat: Option<f64>,
    pub known_issues: Option<String>,
    pub verified_at: Option<String>,
}

pub async fn statute_for(pool: &SqlitePool, jurisdiction: &str, asset_type: &str) -> StoreResult<Option<StatuteAuthority>> {
    Ok(
        sqlx::query_as::<_, StatuteAuthority>("SELECT * FROM statute_authority WHERE jurisdiction = ? AND asset_type = ?")
            .bind(jurisdiction)
            .bind(asset_type)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn upsert_statute(pool: &SqlitePool, statute: &StatuteAuthority) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO statute_authority (jurisdiction, asset_type, statute_years, triggering_event, citation, fee_cap_pct, fee_cap_flat, known_issues, verified_at) \
         VALUES (?,?,?,?,?,?,?,?,?) \
         ON CONFLICT(jurisdiction, asset_type) DO UPDATE SET \
         statute_years = excluded.statute_years, triggering_event = excluded.triggering_event, citation = excluded.citation, \
         fee_cap_pct = excluded.fee_cap_pct, fee_cap_flat = excluded.fee_cap_flat, known_issues = excluded.known_issues, \
         verified_at = excluded.verified_at",
    )
    .bind(&statute.jurisdiction)
    .bind(&statute.asset_type)
    .bind(statute.statute_years)
    .bind(&statute.triggering_event)
    .bind(&statute.citation)
    .bind(statute.fee_cap_pct)
    .bind(statute.fee_cap_flat)
    .bind(&statute.known_issues)
    .bind(&statute.verified_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// One row per registered scraper/adapter, tracked so the crawler scheduler
/// can skip disabled sources and the admin surface can report last-run health.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScraperRegistration {
    pub scraper_name: String,
    pub jurisdiction: String,
    pub last_run_at: Option<String>,
    pub last_status: Option<String>,
    pub records_produced: i64,
    pub enabled: bool,
    pub disabled_reason: Option<String>,
}

pub async fn register_scraper(pool: &SqlitePool, scraper_name: &str, jurisdiction: &str) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO scraper_registry (scraper_name, jurisdiction, records_produced, enabled) VALUES (?,?,0,1) \
         ON CONFLICT(scraper_name) DO NOTHING",
    )
    .bind(scraper_name)
    .bind(jurisdiction)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn record_run(pool: &SqlitePool, scraper_name: &str, status: &str, records_produced: i64, now: &str) -> StoreResult<()> {
    sqlx::query(
        "UPDATE scraper_registry SET last_run_at = ?, last_status = ?, records_produced = records_produced + ? WHERE scraper_name = ?",
    )
    .bind(now)
    .bind(status)
    .bind(records_produced)
    .bind(scraper_name)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn disable_scraper(pool: &SqlitePool, scraper_name: &str, reason: &str) -> StoreResult<()> {
    sqlx::query("UPDATE scraper_registry SET enabled = 0, disabled_reason = ? WHERE scraper_name = ?")
        .bind(reason)
        .bind(scraper_name)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_enabled(pool: &SqlitePool) -> StoreResult<Vec<ScraperRegistration>> {
    Ok(
        sqlx::query_as::<_, ScraperRegistration>("SELECT * FROM scraper_registry WHERE enabled = 1")
            .fetch_all(pool)
            .await?,
    )
}
