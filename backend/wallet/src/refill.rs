use chrono::{DateTime, Utc};
use flx_store::user::Tier;
use sqlx::SqliteConnection;

use crate::error::WalletResult;
use crate::wallet::{self, Bucket};

/// `subscription_create` / `subscription_cycle`: reset to the tier's
/// monthly allocation. Unused subscription credits never roll over.
pub async fn monthly_refill(conn: &mut SqliteConnection, user_id: &str, tier: Tier, now: DateTime<Utc>) -> WalletResult<()> {
    let w = wallet::load_for_update(conn, user_id).await?;
    let allocation = tier.monthly_credits();
    let now_str = now.to_rfc3339();

    let delta = allocation - w.subscription_credits;
    wallet::set_balances(conn, user_id, allocation, w.purchased_credits).await?;
    if delta > 0 {
        wallet::record_transaction(conn, user_id, "credit", Bucket::Subscription, delta, "subscription_refill", None, &now_str).await?;
    } else if delta < 0 {
        wallet::record_transaction(conn, user_id, "debit", Bucket::Subscription, -delta, "subscription_refill_reset", None, &now_str).await?;
    }
    Ok(())
}

/// Mid-cycle tier upgrade: top up to the new allocation, never decrease.
pub async fn upgrade_topup(conn: &mut SqliteConnection, user_id: &str, new_tier: Tier, now: DateTime<Utc>) -> WalletResult<()> {
    let w = wallet::load_for_update(conn, user_id).await?;
    let allocation = new_tier.monthly_credits();
    if allocation <= w.subscription_credits {
        return Ok(());
    }
    let delta = allocation - w.subscription_credits;
    wallet::set_balances(conn, user_id, allocation, w.purchased_credits).await?;
    wallet::record_transaction(conn, user_id, "credit", Bucket::Subscription, delta, "tier_upgrade_topup", None, &now.to_rfc3339()).await?;
    Ok(())
}

/// Starter pack one-time purchase: +10 purchased credits, no expiry.
pub async fn starter_pack(conn: &mut SqliteConnection, user_id: &str, now: DateTime<Utc>) -> WalletResult<()> {
    const STARTER_PACK_CREDITS: i64 = 10;
    let w = wallet::load_for_update(conn, user_id).await?;
    wallet::set_balances(conn, user_id, w.subscription_credits, w.purchased_credits + STARTER_PACK_CREDITS).await?;
    wallet::record_transaction(conn, user_id, "credit", Bucket::Purchased, STARTER_PACK_CREDITS, "starter_pack_purchase", None, &now.to_rfc3339()).await?;
    Ok(())
}

/// Subscription cancellation: tier drops to the floor, purchased credits
/// are left untouched (they were paid for separately).
pub async fn deactivate(conn: &mut SqliteConnection, user_id: &str, now: DateTime<Utc>) -> WalletResult<()> {
    let w = wallet::load_for_update(conn, user_id).await?;
    if w.subscription_credits > 0 {
        wallet::set_balances(conn, user_id, 0, w.purchased_credits).await?;
        wallet::record_transaction(conn, user_id, "debit", Bucket::Subscription, w.subscription_credits, "subscription_deactivated", None, &now.to_rfc3339()).await?;
    }
    Ok(())
}
