use chrono::{DateTime, Utc};
use flx_store::events::{self, EventType};
use flx_store::user;
use flx_wallet::{founders, refill};
use sqlx::SqliteConnection;

use crate::error::BillingResult;
use crate::event::{Disposition, WebhookEvent};

pub enum ProcessOutcome {
    Processed,
    DuplicateIgnored,
}

/// Runs the whole idempotency-check-then-dispatch sequence inside one
/// `write_tx`. A unique-constraint hit on `provider_event_id` is the
/// idempotency barrier from spec.md 4.8: the caller still returns success,
/// just without repeating the mutation.
pub async fn process(
    conn: &mut SqliteConnection,
    event: &WebhookEvent,
    founders_cap: i64,
    now: DateTime<Utc>,
) -> BillingResult<ProcessOutcome> {
    let now_str = now.to_rfc3339();
    let inserted = try_insert_event_row(conn, &event.id, &event.event_type, &now_str).await?;
    if !inserted {
        return Ok(ProcessOutcome::DuplicateIgnored);
    }

    let disposition = crate::event::classify(event);
    let outcome_label = apply(conn, &disposition, founders_cap, now).await?;

    sqlx::query("UPDATE payment_events SET processed_at = ?, outcome = ? WHERE provider_event_id = ?")
        .bind(&now_str)
        .bind(outcome_label)
        .bind(&event.id)
        .execute(&mut *conn)
        .await
        .map_err(flx_store::StoreError::from)?;

    events::record(conn, &event.id, EventType::PaymentEvent, None, Some(&event.event_type), "billing-bridge", None, now).await?;

    Ok(ProcessOutcome::Processed)
}

async fn try_insert_event_row(conn: &mut SqliteConnection, provider_event_id: &str, event_type: &str, now_str: &str) -> BillingResult<bool> {
    let result = sqlx::query("INSERT INTO payment_events (provider_event_id, type, received_at) VALUES (?,?,?)")
        .bind(provider_event_id)
        .bind(event_type)
        .bind(now_str)
        .execute(&mut *conn)
        .await;

    match result {
        Ok(_) => Ok(true),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Ok(false),
        Err(other) => Err(flx_store::StoreError::from(other).into()),
    }
}

async fn apply(conn: &mut SqliteConnection, disposition: &Disposition, founders_cap: i64, now: DateTime<Utc>) -> BillingResult<&'static str> {
    match disposition {
        Disposition::ActivateSubscription { user_id, tier } => {
            let tier_parsed: flx_store::user::Tier = tier.parse()?;
            user::set_tier(conn, user_id, tier_parsed, &now.to_rfc3339()).await?;
            refill::monthly_refill(conn, user_id, tier_parsed, now).await?;
            let _ = founders::try_claim(conn, user_id, founders_cap, now).await?;
            Ok("subscription_activated")
        }
        Disposition::SubscriptionRefill { user_id, tier } => {
            let tier_parsed: flx_store::user::Tier = tier.parse()?;
            refill::monthly_refill(conn, user_id, tier_parsed, now).await?;
            Ok("subscription_refilled")
        }
        Disposition::TierSyncOnly { user_id, tier } => {
            let tier_parsed: flx_store::user::Tier = tier.parse()?;
            user::set_tier(conn, user_id, tier_parsed, &now.to_rfc3339()).await?;
            refill::upgrade_topup(conn, user_id, tier_parsed, now).await?;
            Ok("tier_synced")
        }
        Disposition::GrantStarterPack { user_id } => {
            refill::starter_pack(conn, user_id, now).await?;
            Ok("starter_pack_granted")
        }
        Disposition::DeactivateSubscription { user_id } => {
            user::set_tier(conn, user_id, flx_store::user::Tier::Scout, &now.to_rfc3339()).await?;
            refill::deactivate(conn, user_id, now).await?;
            Ok("subscription_deactivated")
        }
        Disposition::Ignored => Ok("ignored"),
    }
}
