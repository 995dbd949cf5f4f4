use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::adapter::PlatformAdapter;
use crate::dedup::DownloadIndex;
use crate::document::{DocumentRef, DownloadedDocument};
use crate::error::AdapterResult;
use flx_crawler::{Crawler, FetchOutcome};

/// Family (b): ASP.NET WebForms search sites. The search page is a postback
/// form carrying `__VIEWSTATE`/`__EVENTVALIDATION` hidden fields that must
/// be echoed back verbatim on the next request or the server rejects the
/// postback as a forged one.
pub struct AspNetViewstateAdapter {
    jurisdiction: String,
    search_url: String,
    crawler: Crawler,
}

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub viewstate: String,
    pub event_validation: String,
}

impl AspNetViewstateAdapter {
    pub fn new(jurisdiction: impl Into<String>, search_url: impl Into<String>, crawler: Crawler) -> Self {
        Self { jurisdiction: jurisdiction.into(), search_url: search_url.into(), crawler }
    }

    pub async fn fetch_viewstate(&self) -> AdapterResult<ViewState> {
        let outcome = self.crawler.get(&self.search_url).await?;
        let FetchOutcome::Fresh { bytes, .. } = outcome else {
            return Ok(ViewState::default());
        };
        Ok(parse_viewstate(&String::from_utf8_lossy(&bytes)))
    }
}

fn parse_viewstate(html: &str) -> ViewState {
    let document = Html::parse_document(html);
    let viewstate = hidden_field_value(&document, "__VIEWSTATE");
    let event_validation = hidden_field_value(&document, "__EVENTVALIDATION");
    ViewState { viewstate, event_validation }
}

fn hidden_field_value(document: &Html, field_name: &str) -> String {
    let selector = Selector::parse(&format!(r#"input[name="{field_name}"]"#)).expect("static selector is valid");
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("value"))
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl PlatformAdapter for AspNetViewstateAdapter {
    fn name(&self) -> &'static str {
        "aspnet_viewstate"
    }

    fn jurisdiction(&self) -> &str {
        &self.jurisdiction
    }

    async fn discover(&self) -> AdapterResult<Vec<DocumentRef>> {
        // The search results page is itself the document; postback results
        // are discovered by fetch_structured, which needs the viewstate.
        Ok(vec![DocumentRef { url: self.search_url.clone(), label: "search_results".to_string() }])
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_viewstate_hidden_fields() {
        let html = r#"<html><body><form>
            <input type="hidden" name="__VIEWSTATE" value="abc123" />
            <input type="hidden" name="__EVENTVALIDATION" value="def456" />
        </form></body></html>"#;
        let vs = parse_viewstate(html);
        assert_eq!(vs.viewstate, "abc123");
        assert_eq!(vs.event_validation, "def456");
    }
}
