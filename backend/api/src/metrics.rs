use std::sync::OnceLock;
use std::time::Duration;

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

/// Counters and histograms exposed at `GET /api/metrics`. Grounded in the
/// teacher's `MetricsService` shape: one registry, route/status labels on
/// HTTP counters, domain-specific counters for the operations that matter
/// here (unlocks, webhook processing) instead of blockchain metrics.
pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub unlocks_total: IntCounterVec,
    pub unlock_credits_spent: HistogramVec,
    pub webhook_duration_seconds: HistogramVec,
    pub scrape_outcomes_total: IntCounterVec,
    pub extraction_outcomes_total: IntCounterVec,
}

impl Metrics {
    fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total =
            IntCounterVec::new(Opts::new("flx_http_requests_total", "HTTP requests by route and status"), &["route", "status"]).unwrap();
        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new("flx_http_request_duration_seconds", "HTTP request duration by route"),
            &["route"],
        )
        .unwrap();
        let unlocks_total = IntCounterVec::new(Opts::new("flx_unlocks_total", "Lead unlocks by data grade"), &["grade"]).unwrap();
        let unlock_credits_spent = HistogramVec::new(
            HistogramOpts::new("flx_unlock_credits_spent", "Credits spent per unlock by data grade")
                .buckets(vec![1.0, 2.0, 3.0, 4.0, 5.0]),
            &["grade"],
        )
        .unwrap();
        let webhook_duration_seconds = HistogramVec::new(
            HistogramOpts::new("flx_webhook_duration_seconds", "Webhook processing duration by outcome"),
            &["outcome"],
        )
        .unwrap();
        let scrape_outcomes_total =
            IntCounterVec::new(Opts::new("flx_scrape_outcomes_total", "Scraper runs by scraper and outcome"), &["scraper", "outcome"]).unwrap();
        let extraction_outcomes_total = IntCounterVec::new(
            Opts::new("flx_extraction_outcomes_total", "Extraction outcomes by grade bucket"),
            &["grade"],
        )
        .unwrap();

        registry.register(Box::new(http_requests_total.clone())).unwrap();
        registry.register(Box::new(http_request_duration_seconds.clone())).unwrap();
        registry.register(Box::new(unlocks_total.clone())).unwrap();
        registry.register(Box::new(unlock_credits_spent.clone())).unwrap();
        registry.register(Box::new(webhook_duration_seconds.clone())).unwrap();
        registry.register(Box::new(scrape_outcomes_total.clone())).unwrap();
        registry.register(Box::new(extraction_outcomes_total.clone())).unwrap();

        Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            unlocks_total,
            unlock_credits_spent,
            webhook_duration_seconds,
            scrape_outcomes_total,
            extraction_outcomes_total,
        }
    }

    pub fn encode(&self) -> String {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer).expect("prometheus text encoding never fails");
        String::from_utf8(buffer).expect("prometheus output is always valid utf-8")
    }
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

pub fn metrics() -> &'static Metrics {
    METRICS.get_or_init(Metrics::new)
}

pub fn record_http_request(route: &str, status: u16, duration: Duration) {
    metrics().http_requests_total.with_label_values(&[route, &status.to_string()]).inc();
    metrics().http_request_duration_seconds.with_label_values(&[route]).observe(duration.as_secs_f64());
}

pub fn record_unlock(grade: &str, credits_spent: i64) {
    metrics().unlocks_total.with_label_values(&[grade]).inc();
    metrics().unlock_credits_spent.with_label_values(&[grade]).observe(credits_spent as f64);
}

pub fn record_webhook(outcome: &str, duration: Duration) {
    metrics().webhook_duration_seconds.with_label_values(&[outcome]).observe(duration.as_secs_f64());
}
