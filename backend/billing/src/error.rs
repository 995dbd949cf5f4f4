use thiserror::Error;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("webhook signature mismatch")]
    BadSignature,

    #[error("malformed webhook payload: {0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Wallet(#[from] flx_wallet::WalletError),

    #[error(transparent)]
    Store(#[from] flx_store::StoreError),
}

pub type BillingResult<T> = Result<T, BillingError>;
