use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Store(#[from] flx_store::StoreError),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;
