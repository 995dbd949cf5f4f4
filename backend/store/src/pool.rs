use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Executor, SqlitePool};
use tracing::{info, warn};

use crate::error::{StoreError, StoreResult};

/// Write transactions retry this many times on `SQLITE_BUSY` before
/// surfacing a typed `StoreError::Busy` to the caller, per the 2s
/// transaction budget in the concurrency model.
const BUSY_RETRY_ATTEMPTS: u32 = 5;
const BUSY_RETRY_BASE_DELAY: Duration = Duration::from_millis(20);

/// The canonical lead store: a single WAL-mode SQLite file shared by every
/// component that persists state (leads, wallets, ledger, event log).
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if absent) the store file at `path` and run pending
    /// migrations. Re-running this against an already-migrated file is a
    /// no-op.
    pub async fn open(path: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{path}"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(2));

        let pool = SqlitePoolOptions::new()
            .max_connections(16)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!(path, "lead store opened and migrated");

        Ok(Self { pool })
    }

    /// An in-process store for tests: no file touches disk, WAL is
    /// meaningless for `:memory:`, but foreign keys and the schema are real.
    #[cfg(any(test, feature = "test-util"))]
    pub async fn open_in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run `body` inside a `BEGIN IMMEDIATE` transaction, acquiring the
    /// write lock up front rather than on first write (sqlite's default
    /// `BEGIN DEFERRED` would otherwise let two writers race to upgrade and
    /// one loses with `SQLITE_BUSY` mid-transaction). Retries with jittered
    /// backoff on contention, then fails with `StoreError::Busy`.
    pub async fn write_tx<F, T, E>(&self, mut body: F) -> Result<T, E>
    where
        F: for<'c> FnMut(
            &'c mut sqlx::SqliteConnection,
        ) -> futures::future::BoxFuture<'c, Result<T, E>>,
        E: From<StoreError> + std::fmt::Display,
    {
        let mut attempt = 0;
        loop {
            let mut conn = self.pool.acquire().await.map_err(|e| E::from(StoreError::from(e)))?;
            if let Err(err) = conn.execute("BEGIN IMMEDIATE").await {
                if is_busy(&err) && attempt < BUSY_RETRY_ATTEMPTS {
                    attempt += 1;
                    backoff(attempt).await;
                    continue;
                }
                return Err(E::from(StoreError::from(err)));
            }

            match body(&mut conn).await {
                Ok(value) => {
                    conn.execute("COMMIT").await.map_err(|e| E::from(StoreError::from(e)))?;
                    return Ok(value);
                }
                Err(err) => {
                    let _ = conn.execute("ROLLBACK").await;
                    if err.to_string().to_ascii_lowercase().contains("database is locked") && attempt < BUSY_RETRY_ATTEMPTS
                    {
                        attempt += 1;
                        backoff(attempt).await;
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }
}

fn is_busy(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .message()
            .to_ascii_lowercase()
            .contains("database is locked"),
        _ => false,
    }
}

async fn backoff(attempt: u32) {
    let delay = BUSY_RETRY_BASE_DELAY * attempt;
    warn!(attempt, delay_ms = delay.as_millis() as u64, "write transaction contended, retrying");
    tokio::time::sleep(delay).await;
}
