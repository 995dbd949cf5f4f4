use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;

/// Content-hash dedup index consulted before persisting bytes. A real
/// deployment backs this with `lead_provenance.source_hash`; adapters only
/// need the membership test.
#[derive(Clone, Default)]
pub struct DownloadIndex {
    seen: Arc<Mutex<HashSet<String>>>,
}

impl DownloadIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(hashes: impl IntoIterator<Item = String>) -> Self {
        let index = Self::new();
        {
            let mut guard = index.seen.try_lock().expect("fresh index is uncontended");
            guard.extend(hashes);
        }
        index
    }

    /// Returns `true` if this is the first time `sha256_hex` has been seen,
    /// inserting it atomically so concurrent adapters can't both persist.
    pub async fn claim(&self, sha256_hex: &str) -> bool {
        let mut seen = self.seen.lock().await;
        seen.insert(sha256_hex.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_claim_of_same_hash_is_rejected() {
        let index = DownloadIndex::new();
        assert!(index.claim("abc").await);
        assert!(!index.claim("abc").await);
    }
}
