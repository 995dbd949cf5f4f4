use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
pub struct ConditionalEntry {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub content_sha256: Option<String>,
}

/// Persistent (process-lifetime) conditional-request cache keyed by URL. A
/// real deployment would back this with the store; tests and the crawl
/// loop itself only need the in-memory shape.
#[derive(Clone, Default)]
pub struct ConditionalCache {
    entries: Arc<RwLock<HashMap<String, ConditionalEntry>>>,
}

impl ConditionalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, url: &str) -> Option<ConditionalEntry> {
        self.entries.read().await.get(url).cloned()
    }

    pub async fn put(&self, url: &str, entry: ConditionalEntry) {
        self.entries.write().await.insert(url.to_string(), entry);
    }
}
