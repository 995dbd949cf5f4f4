use async_trait::async_trait;
use select::document::Document;
use select::predicate::Name;

use crate::adapter::PlatformAdapter;
use crate::dedup::DownloadIndex;
use crate::document::{DocumentRef, DownloadedDocument};
use crate::error::AdapterResult;
use flx_crawler::{Crawler, FetchOutcome};

/// Family (c): a generic county page with a recognizable link pattern
/// (e.g. `/notices/<year>/<case>.html`) but no PDF calendar and no
/// postback form. `link_pattern` is a substring match against `href`.
pub struct GenericCountyAdapter {
    jurisdiction: String,
    index_url: String,
    link_pattern: String,
    crawler: Crawler,
}

impl GenericCountyAdapter {
    pub fn new(jurisdiction: impl Into<String>, index_url: impl Into<String>, link_pattern: impl Into<String>, crawler: Crawler) -> Self {
        Self { jurisdiction: jurisdiction.into(), index_url: index_url.into(), link_pattern: link_pattern.into(), crawler }
    }
}

#[async_trait]
impl PlatformAdapter for GenericCountyAdapter {
    fn name(&self) -> &'static str {
        "generic_county"
    }

    fn jurisdiction(&self) -> &str {
        &self.jurisdiction
    }

    async fn discover(&self) -> AdapterResult<Vec<DocumentRef>> {
        let outcome = self.crawler.get(&self.index_url).await?;
        let FetchOutcome::Fresh { bytes, .. } = outcome else {
            return Ok(Vec::new());
        };
        let html = String::from_utf8_lossy(&bytes);
        Ok(matching_links(&html, &self.link_pattern))
    }

    async fn download(&self, doc: &DocumentRef, dedup: &DownloadIndex) -> AdapterResult<Option<DownloadedDocument>> {
        let outcome = self.crawler.get(&doc.url).await?;
        match outcome {
            FetchOutcome::NotModified => Ok(None),
            FetchOutcome::Fresh { bytes, sha256_hex } => {
                if !dedup.claim(&sha256_hex).await {
                    return Ok(None);
                }
                Ok(Some(DownloadedDocument { source_url: doc.url.clone(), bytes, sha256_hex }))
            }
        }
    }
}

fn matching_links(html: &str, pattern: &str) -> Vec<DocumentRef> {
    Document::from(html)
        .find(Name("a"))
        .filter_map(|node| node.attr("href").map(str::to_string))
        .filter(|href| href.contains(pattern))
        .map(|href| DocumentRef { label: href.clone(), url: href })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_links_by_pattern() {
        let html = r#"<html><body>
            <a href="/notices/2025/case-001.html">Case 1</a>
            <a href="/about">About</a>
        </body></html>"#;
        let links = matching_links(html, "/notices/");
        assert_eq!(links.len(), 1);
    }
}
