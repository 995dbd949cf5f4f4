use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("lead not found: {0}")]
    LeadNotFound(String),

    #[error("transaction contended, retries exhausted")]
    Busy,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("invalid lead data: {0}")]
    InvalidLead(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
