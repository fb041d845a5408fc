//! Link discovery strategies.
//!
//! Discovery turns an outlet's search page into a bounded, ordered list of
//! candidate article links. Two strategies are available:
//!
//! | Strategy | Input | How links are found |
//! |----------|-------|---------------------|
//! | [`SelectorDiscovery`] | templated search URL | CSS selector over the search page, `href` of each match |
//! | [`AiAssistedDiscovery`] | templated search URL | search page HTML is posted to the link-extraction service |
//!
//! Both return at most `cap` links in discovery order and stop scanning as soon
//! as the cap is reached. A failure to fetch the search page itself, or any
//! failure talking to the extraction service, fails the whole job.

use crate::fetcher::{FetchError, PageFetcher};
use crate::utils::truncate_for_log;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Fallback address of the link-extraction service.
pub const DEFAULT_AI_ANALYZER_URL: &str = "http://ai-analyzer:7654";

/// Job-level discovery failures.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to fetch initial page: {0}")]
    InitialPage(#[from] FetchError),
    #[error("invalid html selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("failed to request links from AI: {0}")]
    AiTransport(#[source] reqwest::Error),
    #[error("AI analyzer returned status {status}: {body}")]
    AiStatus { status: u16, body: String },
    #[error("failed to decode AI response: {0}")]
    AiDecode(#[source] reqwest::Error),
}

/// Which discovery strategy a batch uses.
///
/// Selector discovery needs a per-outlet selector, so the concrete
/// [`LinkDiscovery`] is built per job from this mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryMode {
    Selector,
    AiAssisted { endpoint: String },
    /// Panics on discovery, so tests can crash a job mid-run.
    #[cfg(test)]
    Panicking,
}

/// A ready-to-run discovery strategy for one job.
#[derive(Debug, Clone)]
pub enum LinkDiscovery {
    Selector(SelectorDiscovery),
    AiAssisted(AiAssistedDiscovery),
    #[cfg(test)]
    Panicking,
}

impl LinkDiscovery {
    /// Discover at most `cap` links starting from `start_url`.
    pub async fn discover_links(
        &self,
        fetcher: &PageFetcher,
        start_url: &str,
        cap: usize,
    ) -> Result<Vec<String>, DiscoveryError> {
        match self {
            LinkDiscovery::Selector(s) => s.discover_links(fetcher, start_url, cap).await,
            LinkDiscovery::AiAssisted(a) => a.discover_links(fetcher, start_url, cap).await,
            #[cfg(test)]
            LinkDiscovery::Panicking => panic!("discovery crashed for {start_url}"),
        }
    }
}

/// Scrapes links out of the search page with a CSS selector.
#[derive(Debug, Clone)]
pub struct SelectorDiscovery {
    selector: String,
}

impl SelectorDiscovery {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }

    #[instrument(level = "info", skip_all, fields(selector = %self.selector, %start_url, cap = cap))]
    pub async fn discover_links(
        &self,
        fetcher: &PageFetcher,
        start_url: &str,
        cap: usize,
    ) -> Result<Vec<String>, DiscoveryError> {
        // Validated before any request goes out
        let selector = parse_selector(&self.selector)?;

        info!("Visiting search page");
        let html = fetcher.fetch(start_url).await?;

        let links = extract_links(&html, &selector, start_url, cap);
        info!(count = links.len(), "Discovered links with selector");
        debug!(?links, "Selector links");
        Ok(links)
    }
}

fn parse_selector(selector: &str) -> Result<Selector, DiscoveryError> {
    let trimmed = selector.trim();
    if trimmed.is_empty() {
        return Err(DiscoveryError::InvalidSelector {
            selector: selector.to_string(),
            reason: "selector is empty".to_string(),
        });
    }
    Selector::parse(trimmed).map_err(|e| DiscoveryError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })
}

/// Collect the `href` of each element matching `selector`, stopping at `cap`.
///
/// Kept synchronous so the parsed document never lives across an await.
/// Relative hrefs are resolved against `page_url`. Absolute and
/// scheme-relative (`//host/x`) hrefs are kept verbatim for the job to
/// normalize.
fn extract_links(html: &str, selector: &Selector, page_url: &str, cap: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    document
        .select(selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(|href| resolve_href(base.as_ref(), href))
        .take(cap)
        .collect()
}

fn resolve_href(base: Option<&Url>, href: &str) -> String {
    if href.starts_with("//") || Url::parse(href).is_ok() {
        return href.to_string();
    }
    base.and_then(|base| base.join(href).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| href.to_string())
}

/// Request body sent to the link-extraction service.
#[derive(Debug, Serialize)]
struct GetLinksRequest<'a> {
    html_content: &'a str,
}

/// One link suggested by the link-extraction service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedLink {
    pub title: String,
    pub url: String,
}

/// Delegates link extraction to the external AI service.
#[derive(Debug, Clone)]
pub struct AiAssistedDiscovery {
    endpoint: String,
}

impl AiAssistedDiscovery {
    /// Point discovery at `endpoint`; a blank endpoint falls back to
    /// [`DEFAULT_AI_ANALYZER_URL`].
    pub fn new(endpoint: &str) -> Self {
        let endpoint = endpoint.trim().trim_end_matches('/');
        let endpoint = if endpoint.is_empty() {
            warn!(default = DEFAULT_AI_ANALYZER_URL, "AI analyzer url is empty; using default");
            DEFAULT_AI_ANALYZER_URL
        } else {
            endpoint
        };
        Self {
            endpoint: endpoint.to_string(),
        }
    }

    fn get_links_url(&self) -> String {
        format!("{}/getLinks", self.endpoint)
    }

    #[instrument(level = "info", skip_all, fields(endpoint = %self.endpoint, %start_url, cap = cap))]
    pub async fn discover_links(
        &self,
        fetcher: &PageFetcher,
        start_url: &str,
        cap: usize,
    ) -> Result<Vec<String>, DiscoveryError> {
        info!("Visiting search page");
        let html = fetcher.fetch(start_url).await?;

        let response = fetcher
            .client()
            .post(self.get_links_url())
            .json(&GetLinksRequest {
                html_content: &html,
            })
            .send()
            .await
            .map_err(DiscoveryError::AiTransport)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::AiStatus {
                status: status.as_u16(),
                body: truncate_for_log(&body, 200),
            });
        }

        let extracted: Vec<ExtractedLink> =
            response.json().await.map_err(DiscoveryError::AiDecode)?;

        let links: Vec<String> = extracted
            .into_iter()
            .take(cap)
            .map(|link| {
                debug!(title = %link.title, url = %link.url, "AI suggested link");
                link.url
            })
            .collect();
        info!(count = links.len(), "Discovered links with AI analyzer");
        Ok(links)
    }
}
