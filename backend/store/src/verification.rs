use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, SqliteConnection};

use crate::error::StoreResult;

/// Minimum gap between two verification-code sends to the same user, per
/// spec.md 9(c): a user who mashes "resend" can't use it to spam their own
/// inbox or brute-force the code by requesting fresh ones faster than they
/// can be tried.
pub const RESEND_COOLDOWN: Duration = Duration::seconds(60);

#[derive(Debug, Clone, FromRow)]
pub struct VerificationCode {
    pub user_id: String,
    pub code: String,
    pub expires_at: String,
    pub last_sent_at: String,
    pub send_count: i64,
}

pub enum IssueOutcome {
    Issued(VerificationCode),
    Throttled { retry_after: Duration },
}

/// Insert a fresh code, or overwrite the existing one if the cooldown has
/// elapsed. Returns `Throttled` without touching the row otherwise.
pub async fn issue(conn: &mut SqliteConnection, user_id: &str, code: &str, ttl: Duration, now: DateTime<Utc>) -> StoreResult<IssueOutcome> {
    let existing = sqlx::query_as::<_, VerificationCode>("SELECT * FROM email_verification_codes WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(row) = &existing {
        let last_sent: DateTime<Utc> = row.last_sent_at.parse().unwrap_or(now);
        let elapsed = now.signed_duration_since(last_sent);
        if elapsed < RESEND_COOLDOWN {
            return Ok(IssueOutcome::Throttled { retry_after: RESEND_COOLDOWN - elapsed });
        }
    }

    let expires_at = (now + ttl).to_rfc3339();
    let send_count = existing.map(|r| r.send_count + 1).unwrap_or(1);
    sqlx::query(
        "INSERT INTO email_verification_codes (user_id, code, expires_at, last_sent_at, send_count) VALUES (?,?,?,?,?) \
         ON CONFLICT(user_id) DO UPDATE SET code = excluded.code, expires_at = excluded.expires_at, \
         last_sent_at = excluded.last_sent_at, send_count = excluded.send_count",
    )
    .bind(user_id)
    .bind(code)
    .bind(&expires_at)
    .bind(now.to_rfc3339())
    .bind(send_count)
    .execute(&mut *conn)
    .await?;

    Ok(IssueOutcome::Issued(VerificationCode {
        user_id: user_id.to_string(),
        code: code.to_string(),
        expires_at,
        last_sent_at: now.to_rfc3339(),
        send_count,
    }))
}

pub enum VerifyOutcome {
    Verified,
    CodeMismatch,
    Expired,
    NotFound,
}

pub async fn verify(conn: &mut SqliteConnection, user_id: &str, candidate: &str, now: DateTime<Utc>) -> StoreResult<VerifyOutcome> {
    let row = sqlx::query_as::<_, VerificationCode>("SELECT * FROM email_verification_codes WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
    let Some(row) = row else { return Ok(VerifyOutcome::NotFound) };

    let expires_at: DateTime<Utc> = row.expires_at.parse().unwrap_or(now);
    if now > expires_at {
        return Ok(VerifyOutcome::Expired);
    }
    if row.code != candidate {
        return Ok(VerifyOutcome::CodeMismatch);
    }

    sqlx::query("DELETE FROM email_verification_codes WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(VerifyOutcome::Verified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    #[tokio::test]
    async fn resend_within_cooldown_is_throttled() {
        let store = Store::open_in_memory().await.unwrap();
        let mut conn = store.pool().acquire().await.unwrap();
        sqlx::query("INSERT INTO users (id, email, password_hash, created_at, updated_at) VALUES ('u1','u1@example.com','x','now','now')")
            .execute(&mut *conn)
            .await
            .unwrap();

        let now = Utc::now();
        issue(&mut conn, "u1", "111111", Duration::minutes(15), now).await.unwrap();
        let second = issue(&mut conn, "u1", "222222", Duration::minutes(15), now + Duration::seconds(5)).await.unwrap();
        assert!(matches!(second, IssueOutcome::Throttled { .. }));

        let third = issue(&mut conn, "u1", "333333", Duration::minutes(15), now + Duration::seconds(61)).await.unwrap();
        assert!(matches!(third, IssueOutcome::Issued(_)));
    }

    #[tokio::test]
    async fn verify_rejects_wrong_code_and_consumes_on_success() {
        let store = Store::open_in_memory().await.unwrap();
        let mut conn = store.pool().acquire().await.unwrap();
        sqlx::query("INSERT INTO users (id, email, password_hash, created_at, updated_at) VALUES ('u1','u1@example.com','x','now','now')")
            .execute(&mut *conn)
            .await
            .unwrap();

        let now = Utc::now();
        issue(&mut conn, "u1", "654321", Duration::minutes(15), now).await.unwrap();

        assert!(matches!(verify(&mut conn, "u1", "000000", now).await.unwrap(), VerifyOutcome::CodeMismatch));
        assert!(matches!(verify(&mut conn, "u1", "654321", now).await.unwrap(), VerifyOutcome::Verified));
        assert!(matches!(verify(&mut conn, "u1", "654321", now).await.unwrap(), VerifyOutcome::NotFound));
    }
}
