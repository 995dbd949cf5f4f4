//! Standalone ingestion worker: runs the configured platform adapters on a
//! timer (discover -> download -> extract -> route -> persist/anomaly-log),
//! then runs the lifecycle re-score sweep over every active lead. Separate
//! process from `flx-api`; both point at the same store file.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use flx_adapters::{DownloadIndex, GenericCountyAdapter, PlatformAdapter};
use flx_crawler::{ConditionalCache, Crawler, HostScheduler};
use flx_extraction::{run_adapter, AnomalyLog};
use flx_store::lead::{LeadFilter, Page};
use flx_store::Store;

struct WorkerConfig {
    store_path: String,
    anomaly_log_path: String,
    sweep_interval: Duration,
    per_host_interval_secs: u64,
    adapters: Vec<AdapterSpec>,
}

struct AdapterSpec {
    jurisdiction: String,
    index_url: String,
    link_pattern: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| anyhow!("{key} is set but not parseable")),
        Err(_) => Ok(default),
    }
}

impl WorkerConfig {
    /// `INGEST_ADAPTERS` is a `;`-separated list of `jurisdiction|index_url|link_pattern`
    /// triples, one `GenericCountyAdapter` per entry. No option is read from
    /// anywhere else.
    fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let adapters = env_or("INGEST_ADAPTERS", "")
            .split(';')
            .filter(|entry| !entry.trim().is_empty())
            .map(|entry| {
                let mut parts = entry.split('|');
                let jurisdiction = parts.next().context("adapter entry missing jurisdiction")?.to_string();
                let index_url = parts.next().context("adapter entry missing index_url")?.to_string();
                let link_pattern = parts.next().context("adapter entry missing link_pattern")?.to_string();
                Ok(AdapterSpec { jurisdiction, index_url, link_pattern })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            store_path: env_or("STORE_PATH", "flexion.db"),
            anomaly_log_path: env_or("ANOMALY_LOG_PATH", "anomalies.jsonl"),
            sweep_interval: Duration::from_secs(env_parse("INGEST_SWEEP_INTERVAL_SECS", 900u64)?),
            per_host_interval_secs: env_parse("INGEST_PER_HOST_INTERVAL_SECS", 30u64)?,
            adapters,
        })
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "flx_extraction=info".into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let config = WorkerConfig::from_env()?;
    if config.adapters.is_empty() {
        warn!("INGEST_ADAPTERS is empty; worker will only run lifecycle sweeps");
    }

    let store = Store::open(&config.store_path).await.context("opening store")?;
    let registry = flx_parsers::default_registry();
    let dedup = DownloadIndex::new();
    let anomaly_log = AnomalyLog::new(config.anomaly_log_path.as_str());

    let scheduler = HostScheduler::new(config.per_host_interval_secs);
    let cache = ConditionalCache::new();
    let adapters: Vec<GenericCountyAdapter> = config
        .adapters
        .iter()
        .map(|spec| {
            let crawler = Crawler::new(scheduler.clone(), cache.clone());
            GenericCountyAdapter::new(spec.jurisdiction.clone(), spec.index_url.clone(), spec.link_pattern.clone(), crawler)
        })
        .collect();

    let mut interval = tokio::time::interval(config.sweep_interval);
    loop {
        interval.tick().await;
        let now = Utc::now();

        for adapter in &adapters {
            let mut conn = match store.pool().acquire().await {
                Ok(conn) => conn,
                Err(err) => {
                    warn!(%err, "ingest worker: could not acquire connection");
                    continue;
                }
            };
            let boxed: &dyn PlatformAdapter = adapter;
            match run_adapter(&mut conn, boxed, &dedup, &registry, &anomaly_log, now).await {
                Ok(counts) => info!(jurisdiction = adapter.jurisdiction(), ?counts, "ingest sweep complete"),
                Err(err) => warn!(%err, jurisdiction = adapter.jurisdiction(), "ingest sweep failed"),
            }
        }

        if let Err(err) = run_lifecycle_sweep(&store, now).await {
            warn!(%err, "lifecycle sweep failed");
        }
    }
}

async fn run_lifecycle_sweep(store: &Store, now: chrono::DateTime<Utc>) -> Result<()> {
    let mut conn = store.pool().acquire().await.context("acquiring connection for lifecycle sweep")?;
    let filter = LeadFilter::default();
    let page = Page { offset: 0, limit: 10_000 };
    let leads = flx_store::lead::list(&mut conn, &filter, page).await.context("listing leads for lifecycle sweep")?;

    let mut rescored = 0usize;
    let mut quarantined = 0usize;
    let mut demoted = 0usize;

    for lead in &leads {
        let updated_at = chrono::DateTime::parse_from_rfc3339(&lead.updated_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(now);
        let days_since_updated = (now - updated_at).num_days().max(0);
        let days_to_deadline = lead
            .claim_deadline_naive()
            .map(|deadline| (deadline - now.date_naive()).num_days())
            .unwrap_or(i64::MAX);

        let outcome = flx_lifecycle::rescore_one(&mut conn, lead, days_since_updated, days_to_deadline, now).await?;
        rescored += 1;
        if outcome.quarantined {
            quarantined += 1;
        }
        if outcome.demoted {
            demoted += 1;
        }
    }

    info!(rescored, quarantined, demoted, "lifecycle sweep complete");
    Ok(())
}
