use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::error::StoreResult;

pub async fn record(conn: &mut SqliteConnection, user_id: &str, lead_id: &str, now: DateTime<Utc>) -> StoreResult<()> {
    sqlx::query("INSERT INTO lead_views (user_id, lead_id, viewed_at) VALUES (?,?,?)")
        .bind(user_id)
        .bind(lead_id)
        .bind(now.to_rfc3339())
        .execute(conn)
        .await?;
    Ok(())
}

/// Distinct leads viewed by `user_id` since the start of `now`'s calendar
/// day, for `flx_auth::gates::require_daily_view_quota`.
pub async fn count_today(conn: &mut SqliteConnection, user_id: &str, now: DateTime<Utc>) -> StoreResult<u32> {
    let day_start = now.date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc();
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(DISTINCT lead_id) FROM lead_views WHERE user_id = ? AND viewed_at >= ?")
            .bind(user_id)
            .bind(day_start.to_rfc3339())
            .fetch_one(conn)
            .await?;
    Ok(count as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;
    use chrono::Duration;

    #[tokio::test]
    async fn only_views_from_today_count_and_repeats_dont_double_count_distinct_leads() {
        let store = Store::open_in_memory().await.unwrap();
        let mut conn = store.pool().acquire().await.unwrap();
        sqlx::query("INSERT INTO users (id, email, password_hash, created_at, updated_at) VALUES ('u1','u1@example.com','x','now','now')")
            .execute(&mut *conn)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO leads (id, data_grade, record_hash, created_at, updated_at) VALUES ('l1','GOLD','rh1','now','now'), ('l2','GOLD','rh2','now','now')",
        )
        .execute(&mut *conn)
        .await
        .unwrap();

        let now = Utc::now();
        record(&mut conn, "u1", "l1", now - Duration::days(1)).await.unwrap();
        record(&mut conn, "u1", "l1", now).await.unwrap();
        record(&mut conn, "u1", "l2", now).await.unwrap();

        assert_eq!(count_today(&mut conn, "u1", now).await.unwrap(), 2);
    }
}
