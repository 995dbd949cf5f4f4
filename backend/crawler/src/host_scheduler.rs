use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tokio::sync::Mutex;

pub const DEFAULT_MIN_INTERVAL_SECS: u64 = 30;

type HostLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Per-host token bucket enforcing a minimum inter-request interval. One
/// limiter per host, created lazily on first request to that host.
#[derive(Clone)]
pub struct HostScheduler {
    min_interval_secs: u64,
    limiters: Arc<Mutex<HashMap<String, Arc<HostLimiter>>>>,
}

impl HostScheduler {
    pub fn new(min_interval_secs: u64) -> Self {
        Self { min_interval_secs: min_interval_secs.max(1), limiters: Arc::new(Mutex::new(HashMap::new())) }
    }

    pub fn with_default_interval() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL_SECS)
    }

    /// Blocks (cooperatively) until `host` is allowed to issue its next
    /// request, per the 30 s/host (default) interval.
    pub async fn wait_turn(&self, host: &str) {
        let limiter = self.limiter_for(host).await;
        limiter.until_ready().await;
    }

    async fn limiter_for(&self, host: &str) -> Arc<HostLimiter> {
        let mut limiters = self.limiters.lock().await;
        if let Some(limiter) = limiters.get(host) {
            return limiter.clone();
        }
        let quota = Quota::with_period(std::time::Duration::from_secs(self.min_interval_secs))
            .expect("non-zero interval")
            .allow_burst(NonZeroU32::new(1).expect("one is non-zero"));
        let limiter = Arc::new(RateLimiter::direct(quota));
        limiters.insert(host.to_string(), limiter.clone());
        limiter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn first_request_to_a_host_is_immediate() {
        let scheduler = HostScheduler::new(30);
        let start = Instant::now();
        scheduler.wait_turn("example.gov").await;
        assert!(start.elapsed().as_millis() < 100);
    }

    #[tokio::test]
    async fn distinct_hosts_do_not_share_a_bucket() {
        let scheduler = HostScheduler::new(30);
        scheduler.wait_turn("a.example.gov").await;
        let start = Instant::now();
        scheduler.wait_turn("b.example.gov").await;
        assert!(start.elapsed().as_millis() < 100);
    }
}
