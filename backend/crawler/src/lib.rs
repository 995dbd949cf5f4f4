//! Polite crawler: per-host rate limiting, conditional GET, retry with
//! full-jitter backoff, and robots.txt enforcement. Platform adapters
//! (`flx-adapters`) drive this to pull bytes; parsing happens downstream.

pub mod backoff;
pub mod conditional_cache;
pub mod error;
pub mod fetch;
pub mod host_scheduler;
pub mod robots;

pub use conditional_cache::ConditionalCache;
pub use error::{CrawlError, CrawlErrorKind, CrawlResult};
pub use fetch::{Crawler, FetchOutcome};
pub use host_scheduler::HostScheduler;
pub use robots::RobotsPolicy;
