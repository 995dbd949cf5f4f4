use async_trait::async_trait;

use crate::dedup::DownloadIndex;
use crate::document::{DocumentRef, DownloadedDocument};
use crate::error::AdapterResult;
use flx_parsers::RawRecord;
use flx_store::lead::DocumentType;

/// Capability set every platform family exposes, per spec.md 4.2.
/// `fetch_structured` is optional: HTML-table platforms can skip
/// document-by-document extraction entirely.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn name(&self) -> &'static str;
    fn jurisdiction(&self) -> &str;

    async fn discover(&self) -> AdapterResult<Vec<DocumentRef>>;

    async fn download(&self, doc: &DocumentRef, dedup: &DownloadIndex) -> AdapterResult<Option<DownloadedDocument>>;

    async fn fetch_structured(&self) -> AdapterResult<Vec<RawRecord>> {
        Ok(Vec::new())
    }

    /// Most adapters publish final sale/disposition records. Calendar
    /// adapters are the exception -- they list upcoming sales, not
    /// completed ones, which is why the quarantine sweep's ghost-zero-value
    /// rule only fires for this document type.
    fn document_type(&self) -> DocumentType {
        DocumentType::SaleResult
    }
}
