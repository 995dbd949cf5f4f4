use thiserror::Error;

/// The extraction engine never surfaces parser errors to the API; text
/// extraction failures are the only thing that escapes this crate as an
/// error, and even those are logged and skipped by the caller rather than
/// aborting a whole batch.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("could not extract text from document: {0}")]
    TextExtractionFailed(String),

    #[error("adapter discovery failed: {0}")]
    AdapterFailed(String),

    #[error(transparent)]
    Store(#[from] flx_store::StoreError),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;
