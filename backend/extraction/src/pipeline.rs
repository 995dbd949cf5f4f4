use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::{info, warn};

use flx_adapters::{DownloadIndex, PlatformAdapter};
use flx_parsers::ParserRegistry;

use crate::anomaly_log::AnomalyLog;
use crate::error::{ExtractionError, ExtractionResult};
use crate::route::{route_document, RouteOutcome};
use crate::text::extract_text;

#[derive(Debug, Default)]
pub struct PipelineCounts {
    pub documents_discovered: usize,
    pub documents_downloaded: usize,
    pub leads_persisted: usize,
    pub anomalies_logged: usize,
    pub download_failures: usize,
}

/// Drives one adapter all the way through: discover -> download -> extract
/// text -> route through the parser registry -> persist or log as an
/// anomaly. A single bad document never aborts the rest of the batch --
/// its failure is logged and the loop moves on, matching the anomaly log's
/// own "never silently drop a record" rule.
pub async fn run_adapter(
    conn: &mut SqliteConnection,
    adapter: &dyn PlatformAdapter,
    dedup: &DownloadIndex,
    registry: &ParserRegistry,
    anomaly_log: &AnomalyLog,
    now: DateTime<Utc>,
) -> ExtractionResult<PipelineCounts> {
    let mut counts = PipelineCounts::default();
    let document_type = adapter.document_type();

    let refs = adapter.discover().await.map_err(|e| ExtractionError::AdapterFailed(e.to_string()))?;
    counts.documents_discovered = refs.len();

    for doc_ref in &refs {
        let downloaded = match adapter.download(doc_ref, dedup).await {
            Ok(Some(doc)) => doc,
            Ok(None) => continue,
            Err(err) => {
                warn!(url = %doc_ref.url, %err, adapter = adapter.name(), "document download failed");
                counts.download_failures += 1;
                continue;
            }
        };
        counts.documents_downloaded += 1;

        let text = match extract_text(&downloaded.bytes, None) {
            Ok(text) => text,
            Err(err) => {
                warn!(url = %doc_ref.url, %err, adapter = adapter.name(), "text extraction failed");
                counts.download_failures += 1;
                continue;
            }
        };

        let outcomes = route_document(conn, registry, &text, Some(&downloaded.source_url), document_type, now).await?;
        for outcome in outcomes {
            match outcome {
                RouteOutcome::Persisted(_) => counts.leads_persisted += 1,
                RouteOutcome::Anomaly(record) => {
                    anomaly_log.append(&record).await?;
                    counts.anomalies_logged += 1;
                }
            }
        }
    }

    info!(
        adapter = adapter.name(),
        jurisdiction = adapter.jurisdiction(),
        discovered = counts.documents_discovered,
        downloaded = counts.documents_downloaded,
        persisted = counts.leads_persisted,
        anomalies = counts.anomalies_logged,
        "adapter sweep complete"
    );

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flx_adapters::{AdapterResult, DocumentRef, DownloadedDocument};
    use flx_store::Store;

    struct FixedAdapter {
        docs: Vec<(DocumentRef, Vec<u8>)>,
    }

    #[async_trait]
    impl PlatformAdapter for FixedAdapter {
        fn name(&self) -> &'static str {
            "fixed_test_adapter"
        }

        fn jurisdiction(&self) -> &str {
            "test"
        }

        async fn discover(&self) -> AdapterResult<Vec<DocumentRef>> {
            Ok(self.docs.iter().map(|(d, _)| d.clone()).collect())
        }

        async fn download(&self, doc: &DocumentRef, dedup: &DownloadIndex) -> AdapterResult<Option<DownloadedDocument>> {
            let (_, bytes) = self.docs.iter().find(|(d, _)| d == doc).expect("fixed doc exists");
            let sha256_hex = flx_crypto::sha256_hex(bytes);
            if !dedup.claim(&sha256_hex).await {
                return Ok(None);
            }
            Ok(Some(DownloadedDocument { source_url: doc.url.clone(), bytes: bytes.clone(), sha256_hex }))
        }
    }

    #[tokio::test]
    async fn full_sweep_persists_a_lead_and_logs_an_anomaly() {
        let store = Store::open_in_memory().await.unwrap();
        let registry = flx_parsers::default_registry();
        let adapter = FixedAdapter {
            docs: vec![
                (
                    DocumentRef { url: "https://county.example.gov/a".to_string(), label: "a".to_string() },
                    b"Case 24-CV-00123 sold 2025-03-14. Debt $210,000.00, winning bid $285,000.00. Address 1234 Main St, Brighton, CO. Owner SMITH, JOHN.".to_vec(),
                ),
                (
                    DocumentRef { url: "https://county.example.gov/b".to_string(), label: "b".to_string() },
                    b"Owner JONES.".to_vec(),
                ),
            ],
        };

        let dir = std::env::temp_dir().join(format!("flx-pipeline-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let anomaly_log = AnomalyLog::new(dir.join("anomalies.jsonl"));

        let mut conn = store.pool().acquire().await.unwrap();
        let counts =
            run_adapter(&mut conn, &adapter, &DownloadIndex::new(), &registry, &anomaly_log, Utc::now()).await.unwrap();

        assert_eq!(counts.documents_discovered, 2);
        assert_eq!(counts.leads_persisted, 1);
        assert_eq!(counts.anomalies_logged, 1);
        std::fs::remove_dir_all(&dir).ok();
    }
}
