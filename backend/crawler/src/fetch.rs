use reqwest::{Client, StatusCode};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{info, warn};

use crate::backoff::{full_jitter_delay, MAX_ATTEMPTS};
use crate::conditional_cache::{ConditionalCache, ConditionalEntry};
use crate::error::{CrawlError, CrawlResult};
use crate::host_scheduler::HostScheduler;

pub const PER_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_USER_AGENT: &str = "FlexionLeadCrawler/1.0 (+https://flexionintel.com/crawler)";

#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// `304 Not Modified`: no new bytes, first-class success.
    NotModified,
    Fresh { bytes: Vec<u8>, sha256_hex: String },
}

pub struct Crawler {
    client: Client,
    scheduler: HostScheduler,
    cache: ConditionalCache,
    user_agent: String,
}

impl Crawler {
    pub fn new(scheduler: HostScheduler, cache: ConditionalCache) -> Self {
        let client = Client::builder()
            .timeout(PER_REQUEST_TIMEOUT)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .expect("reqwest client builds with static config");
        Self { client, scheduler, cache, user_agent: DEFAULT_USER_AGENT.to_string() }
    }

    /// Fetches `url`, honoring the per-host schedule, conditional-GET
    /// cache, and bounded retry/backoff on transient failures.
    pub async fn get(&self, url: &str) -> CrawlResult<FetchOutcome> {
        let host = host_of(url)?;
        let mut attempt = 0u32;

        loop {
            self.scheduler.wait_turn(&host).await;
            match self.try_once(url).await {
                Ok(outcome) => return Ok(outcome),
                Err(err) if err.kind == crate::error::CrawlErrorKind::Transient && attempt < MAX_ATTEMPTS => {
                    attempt += 1;
                    let delay = err.retry_after.unwrap_or_else(|| full_jitter_delay(attempt));
                    warn!(
                        url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        retry_after_honored = err.retry_after.is_some(),
                        "transient crawl failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_once(&self, url: &str) -> CrawlResult<FetchOutcome> {
        let cached = self.cache.get(url).await;
        let mut request = self.client.get(url);
        if let Some(entry) = &cached {
            if let Some(etag) = &entry.etag {
                request = request.header("If-None-Match", etag.clone());
            }
            if let Some(last_modified) = &entry.last_modified {
                request = request.header("If-Modified-Since", last_modified.clone());
            }
        }

        let response = request.send().await.map_err(|e| classify_transport_error(url, &e))?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            info!(url, "304 not modified");
            return Ok(FetchOutcome::NotModified);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = parse_retry_after(response.headers());
            return Err(CrawlError::rate_limited(url, format!("status {status}"), retry_after));
        }

        if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
            return Err(CrawlError::transient(url, format!("status {status}")));
        }

        if status == StatusCode::FORBIDDEN || status == StatusCode::from_u16(451).unwrap() {
            return Err(CrawlError::blocked(url, format!("status {status}")));
        }

        if !status.is_success() {
            return Err(CrawlError::permanent(url, format!("status {status}")));
        }

        let etag = response.headers().get("etag").and_then(|v| v.to_str().ok()).map(str::to_string);
        let last_modified = response.headers().get("last-modified").and_then(|v| v.to_str().ok()).map(str::to_string);

        let bytes = response.bytes().await.map_err(|e| CrawlError::transient(url, e.to_string()))?;
        let sha256_hex = hex::encode(Sha256::digest(&bytes));

        self.cache
            .put(url, ConditionalEntry { etag, last_modified, content_sha256: Some(sha256_hex.clone()) })
            .await;

        Ok(FetchOutcome::Fresh { bytes: bytes.to_vec(), sha256_hex })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

/// `Retry-After` is either a delay in seconds or an HTTP-date; only the
/// seconds form is honored here, which is what every county/auction host
/// observed so far actually sends on 429.
fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers.get(reqwest::header::RETRY_AFTER).and_then(|v| v.to_str().ok()).and_then(|s| s.trim().parse::<u64>().ok()).map(Duration::from_secs)
}

fn classify_transport_error(url: &str, err: &reqwest::Error) -> CrawlError {
    if err.is_timeout() || err.is_connect() {
        CrawlError::transient(url, err.to_string())
    } else {
        CrawlError::permanent(url, err.to_string())
    }
}

fn host_of(url: &str) -> CrawlResult<String> {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .ok_or_else(|| CrawlError::permanent(url, "unparseable URL"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn successful_fetch_populates_conditional_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc.pdf"))
            .respond_with(ResponseTemplate::new(200).insert_header("etag", "\"abc\"").set_body_bytes(b"hello".to_vec()))
            .mount(&server)
            .await;

        let crawler = Crawler::new(HostScheduler::new(1), ConditionalCache::new());
        let url = format!("{}/doc.pdf", server.uri());
        let outcome = crawler.get(&url).await.unwrap();
        match outcome {
            FetchOutcome::Fresh { sha256_hex, .. } => assert_eq!(sha256_hex.len(), 64),
            FetchOutcome::NotModified => panic!("expected fresh fetch"),
        }
    }

    #[tokio::test]
    async fn not_modified_is_treated_as_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/doc.pdf")).respond_with(ResponseTemplate::new(304)).mount(&server).await;

        let crawler = Crawler::new(HostScheduler::new(1), ConditionalCache::new());
        let url = format!("{}/doc.pdf", server.uri());
        let outcome = crawler.get(&url).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::NotModified));
    }

    #[tokio::test]
    async fn rate_limit_retry_after_is_captured_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc.pdf"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "2"))
            .mount(&server)
            .await;

        let crawler = Crawler::new(HostScheduler::new(1), ConditionalCache::new());
        let url = format!("{}/doc.pdf", server.uri());
        let err = crawler.try_once(&url).await.unwrap_err();
        assert_eq!(err.kind, crate::error::CrawlErrorKind::Transient);
        assert_eq!(err.retry_after, Some(Duration::from_secs(2)));
    }

    #[tokio::test]
    async fn forbidden_status_is_classified_as_blocked() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/doc.pdf")).respond_with(ResponseTemplate::new(403)).mount(&server).await;

        let crawler = Crawler::new(HostScheduler::new(1), ConditionalCache::new());
        let url = format!("{}/doc.pdf", server.uri());
        let err = crawler.get(&url).await.unwrap_err();
        assert_eq!(err.kind, crate::error::CrawlErrorKind::Blocked);
    }
}
