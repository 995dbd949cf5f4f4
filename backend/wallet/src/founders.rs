use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::error::WalletResult;

pub const FOUNDERS_CAP_DEFAULT: i64 = 100;

pub enum ClaimOutcome {
    Claimed,
    CapReached { current_count: i64 },
}

/// Must run inside a `BEGIN IMMEDIATE` write transaction: reads the current
/// claim count and inserts iff under cap, all under the same write lock so
/// two concurrent registrations cannot both observe `count < cap`.
pub async fn try_claim(conn: &mut SqliteConnection, user_id: &str, cap: i64, now: DateTime<Utc>) -> WalletResult<ClaimOutcome> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM founders_slots")
        .fetch_one(&mut *conn)
        .await
        .map_err(flx_store::StoreError::from)?;

    if count >= cap {
        return Ok(ClaimOutcome::CapReached { current_count: count });
    }

    sqlx::query("INSERT INTO founders_slots (user_id, claimed_at) VALUES (?, ?)")
        .bind(user_id)
        .bind(now.to_rfc3339())
        .execute(conn)
        .await
        .map_err(flx_store::StoreError::from)?;

    Ok(ClaimOutcome::Claimed)
}

pub async fn is_founder(conn: &mut SqliteConnection, user_id: &str) -> WalletResult<bool> {
    let row: Option<(String,)> = sqlx::query_as("SELECT user_id FROM founders_slots WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(conn)
        .await
        .map_err(flx_store::StoreError::from)?;
    Ok(row.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flx_store::Store;

    #[tokio::test]
    async fn claim_stops_exactly_at_cap() {
        let store = Store::open_in_memory().await.unwrap();

        for i in 0..3 {
            let user_id = format!("founder-{i}");
            sqlx::query("INSERT INTO users (id, email, password_hash, created_at, updated_at) VALUES (?, ?, 'x', 'now', 'now')")
                .bind(&user_id)
                .bind(format!("{user_id}@example.com"))
                .execute(store.pool())
                .await
                .unwrap();
            let outcome = store
                .write_tx(|conn| Box::pin(try_claim(conn, &user_id, 2, Utc::now())))
                .await
                .unwrap();
            if i < 2 {
                assert!(matches!(outcome, ClaimOutcome::Claimed));
            } else {
                assert!(matches!(outcome, ClaimOutcome::CapReached { current_count: 2 }));
            }
        }
    }
}
