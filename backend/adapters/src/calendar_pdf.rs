use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::adapter::PlatformAdapter;
use crate::dedup::DownloadIndex;
use crate::document::{DocumentRef, DownloadedDocument};
use crate::error::AdapterResult;
use flx_crawler::{Crawler, FetchOutcome};

/// Family (a): a foreclosure-calendar page listing sale dates with linked
/// PDF notices. `discover` scrapes the calendar HTML for PDF anchors;
/// `download` fetches each one through the polite crawler.
pub struct CalendarPdfAdapter {
    jurisdiction: String,
    calendar_url: String,
    crawler: Crawler,
}

impl CalendarPdfAdapter {
    pub fn new(jurisdiction: impl Into<String>, calendar_url: impl Into<String>, crawler: Crawler) -> Self {
        Self { jurisdiction: jurisdiction.into(), calendar_url: calendar_url.into(), crawler }
    }
}

#[async_trait]
impl PlatformAdapter for CalendarPdfAdapter {
    fn name(&self) -> &'static str {
        "calendar_pdf"
    }

    fn jurisdiction(&self) -> &str {
        &self.jurisdiction
    }

    fn document_type(&self) -> flx_store::lead::DocumentType {
        flx_store::lead::DocumentType::PreSaleNotice
    }

    async fn discover(&self) -> AdapterResult<Vec<DocumentRef>> {
        let outcome = self.crawler.get(&self.calendar_url).await?;
        let FetchOutcome::Fresh { bytes, .. } = outcome else {
            return Ok(Vec::new());
        };
        let html = String::from_utf8_lossy(&bytes);
        Ok(extract_pdf_links(&html, &self.calendar_url))
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

fn extract_pdf_links(html: &str, base_url: &str) -> Vec<DocumentRef> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").expect("static selector is valid");
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter(|href| href.to_ascii_lowercase().ends_with(".pdf"))
        .map(|href| DocumentRef { url: resolve(base_url, href), label: href.to_string() })
        .collect()
}

fn resolve(base_url: &str, href: &str) -> String {
    reqwest::Url::parse(base_url)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_only_pdf_anchors() {
        let html = r#"<html><body>
            <a href="/sales/2025-01-15.pdf">Jan 15</a>
            <a href="/about">About</a>
        </body></html>"#;
        let links = extract_pdf_links(html, "https://county.example.gov/calendar");
        assert_eq!(links.len(), 1);
        assert!(links[0].url.ends_with("2025-01-15.pdf"));
    }
}
