use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::adapter::PlatformAdapter;
use crate::dedup::DownloadIndex;
use crate::document::{DocumentRef, DownloadedDocument};
use crate::error::AdapterResult;

/// The fifth family: operator-ingested bytes, exempt from crawling
/// entirely. Used for sources with no stable automatable shape (ad hoc
/// emailed spreadsheets, walk-in clerk printouts).
pub struct ManualAdapter {
    jurisdiction: String,
}

impl ManualAdapter {
    pub fn new(jurisdiction: impl Into<String>) -> Self {
        Self { jurisdiction: jurisdiction.into() }
    }

    pub async fn ingest(&self, source_label: &str, bytes: Vec<u8>, dedup: &DownloadIndex) -> Option<DownloadedDocument> {
        let sha256_hex = hex::encode(Sha256::digest(&bytes));
        if !dedup.claim(&sha256_hex).await {
            return None;
        }
        Some(DownloadedDocument { source_url: format!("manual://{}/{}", self.jurisdiction, source_label), bytes, sha256_hex })
    }
}

#[async_trait]
impl PlatformAdapter for ManualAdapter {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn jurisdiction(&self) -> &str {
        &self.jurisdiction
    }

    async fn discover(&self) -> AdapterResult<Vec<DocumentRef>> {
        Ok(Vec::new())
    }

    async fn download(&self, _doc: &DocumentRef, _dedup: &DownloadIndex) -> AdapterResult<Option<DownloadedDocument>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ingest_dedups_by_content_hash() {
        let adapter = ManualAdapter::new("weld");
        let dedup = DownloadIndex::new();
        let first = adapter.ingest("batch-1", b"same bytes".to_vec(), &dedup).await;
        assert!(first.is_some());
        let second = adapter.ingest("batch-2", b"same bytes".to_vec(), &dedup).await;
        assert!(second.is_none());
    }
}
