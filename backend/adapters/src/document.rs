use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    pub url: String,
    /// Stable label the adapter assigns, e.g. a sale date or docket id,
    /// used only for operator-facing logging.
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct DownloadedDocument {
    pub source_url: String,
    pub bytes: Vec<u8>,
    pub sha256_hex: String,
}
