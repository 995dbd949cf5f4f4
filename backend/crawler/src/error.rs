use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlErrorKind {
    /// Worth retrying: 408/429/5xx or a connection-level failure.
    Transient,
    /// Not worth retrying this run, but not a policy violation either.
    Permanent,
    /// Disallowed by robots.txt or an explicit block; disable the source.
    Blocked,
}

#[derive(Debug, Error)]
#[error("crawl failed ({kind:?}) for {url}: {message}")]
pub struct CrawlError {
    pub kind: CrawlErrorKind,
    pub url: String,
    pub message: String,
    /// Set when the server sent a `Retry-After` header (always a 429 in
    /// practice); the retry loop honors this verbatim instead of its own
    /// jittered backoff.
    pub retry_after: Option<Duration>,
}

impl CrawlError {
    pub fn transient(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self { kind: CrawlErrorKind::Transient, url: url.into(), message: message.into(), retry_after: None }
    }

    pub fn rate_limited(url: impl Into<String>, message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self { kind: CrawlErrorKind::Transient, url: url.into(), message: message.into(), retry_after }
    }

    pub fn permanent(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self { kind: CrawlErrorKind::Permanent, url: url.into(), message: message.into(), retry_after: None }
    }

    pub fn blocked(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self { kind: CrawlErrorKind::Blocked, url: url.into(), message: message.into(), retry_after: None }
    }
}

pub type CrawlResult<T> = Result<T, CrawlError>;
