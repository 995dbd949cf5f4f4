use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Crawl(#[from] flx_crawler::CrawlError),

    #[error("unexpected document shape: {0}")]
    UnexpectedShape(String),
}

pub type AdapterResult<T> = Result<T, AdapterError>;
