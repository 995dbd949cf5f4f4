use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("insufficient credits: needed {needed}, had {available}")]
    InsufficientFunds { needed: i64, available: i64 },

    #[error("lead is gone: claim deadline has passed")]
    LeadExpired,

    #[error("wallet not found for user {0}")]
    WalletNotFound(String),

    #[error(transparent)]
    Store(#[from] flx_store::StoreError),
}

pub type WalletResult<T> = Result<T, WalletError>;
