use chrono::{DateTime, Utc};
use flx_store::events::{self, EventType};
use flx_store::lead::{self, Lead, LeadStatus};
use sqlx::SqliteConnection;

use crate::error::{WalletError, WalletResult};
use crate::wallet::{self, Bucket, Wallet};

pub enum UnlockOutcome {
    Unlocked { lead: Lead, credits_spent: i64 },
    AlreadyUnlocked { lead: Lead },
}

/// The full unlock algorithm from spec.md 4.7, run inside the store's
/// `write_tx` so every step below shares one `BEGIN IMMEDIATE` transaction.
#[allow(clippy::too_many_arguments)]
pub async fn unlock(
    conn: &mut SqliteConnection,
    user_id: &str,
    lead_id: &str,
    tier: &str,
    client_ip: Option<&str>,
    restriction_months: u32,
    now: DateTime<Utc>,
) -> WalletResult<UnlockOutcome> {
    let target = lead::get(conn, lead_id).await?;

    if let Some(existing) = already_unlocked(conn, user_id, lead_id).await? {
        let _ = existing;
        return Ok(UnlockOutcome::AlreadyUnlocked { lead: target });
    }

    if matches!(target.status(now, restriction_months), LeadStatus::Expired) {
        return Err(WalletError::LeadExpired);
    }

    let mut w: Wallet = wallet::load_for_update(conn, user_id).await?;
    let credits_required = target.grade()?.credits_required();

    if w.total() < credits_required {
        return Err(WalletError::InsufficientFunds { needed: credits_required, available: w.total() });
    }

    let now_str = now.to_rfc3339();
    let (from_subscription, from_purchased) = w.split_debit(credits_required);

    if from_subscription > 0 {
        w.subscription_credits -= from_subscription;
        wallet::record_transaction(conn, user_id, "debit", Bucket::Subscription, from_subscription, "lead_unlock", Some(lead_id), &now_str).await?;
    }

    if from_purchased > 0 {
        w.purchased_credits -= from_purchased;
        wallet::record_transaction(conn, user_id, "debit", Bucket::Purchased, from_purchased, "lead_unlock", Some(lead_id), &now_str).await?;
    }

    wallet::set_balances(conn, user_id, w.subscription_credits, w.purchased_credits).await?;

    sqlx::query(
        "INSERT INTO unlocks (user_id, lead_id, unlocked_at, credits_spent, client_ip, tier_at_unlock) VALUES (?,?,?,?,?,?)",
    )
    .bind(user_id)
    .bind(lead_id)
    .bind(&now_str)
    .bind(credits_required)
    .bind(client_ip)
    .bind(tier)
    .execute(&mut *conn)
    .await
    .map_err(flx_store::StoreError::from)?;

    let reason = format!("cost={}, grade={}", credits_required, target.grade()?.as_str());
    events::record(conn, lead_id, EventType::LeadUnlock, None, Some(user_id), "wallet-engine", Some(&reason), now).await?;

    Ok(UnlockOutcome::Unlocked { lead: target, credits_spent: credits_required })
}

async fn already_unlocked(conn: &mut SqliteConnection, user_id: &str, lead_id: &str) -> WalletResult<Option<()>> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM unlocks WHERE user_id = ? AND lead_id = ?")
        .bind(user_id)
        .bind(lead_id)
        .fetch_optional(conn)
        .await
        .map_err(flx_store::StoreError::from)?;
    Ok(row.map(|_| ()))
}
