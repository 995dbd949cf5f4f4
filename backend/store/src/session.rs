use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use crate::error::StoreResult;

/// A login-issued session row, tracked purely so the concurrent-session gate
/// has something to count against -- the JWT itself is stateless and is
/// never looked up here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub issued_at: String,
    pub expires_at: String,
}

pub async fn create(conn: &mut SqliteConnection, id: &str, user_id: &str, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> StoreResult<()> {
    sqlx::query("INSERT INTO sessions (id, user_id, issued_at, expires_at) VALUES (?,?,?,?)")
        .bind(id)
        .bind(user_id)
        .bind(issued_at.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(conn)
        .await?;
    Ok(())
}

/// Count of sessions for `user_id` that haven't expired yet, used by
/// `flx_auth::gates::require_session_quota`.
pub async fn count_active(conn: &mut SqliteConnection, user_id: &str, now: DateTime<Utc>) -> StoreResult<u32> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE user_id = ? AND expires_at > ?")
        .bind(user_id)
        .bind(now.to_rfc3339())
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
    async fn expired_sessions_do_not_count_toward_the_quota() {
        let store = Store::open_in_memory().await.unwrap();
        let mut conn = store.pool().acquire().await.unwrap();
        sqlx::query("INSERT INTO users (id, email, password_hash, created_at, updated_at) VALUES ('u1','u1@example.com','x','now','now')")
            .execute(&mut *conn)
            .await
            .unwrap();

        let now = Utc::now();
        create(&mut conn, "s1", "u1", now - Duration::hours(2), now - Duration::hours(1)).await.unwrap();
        create(&mut conn, "s2", "u1", now, now + Duration::hours(1)).await.unwrap();

        assert_eq!(count_active(&mut conn, "u1", now).await.unwrap(), 1);
    }
}
