//! Crawl job state machine.
//!
//! A [`CrawlJob`] crawls one outlet for one query:
//!
//! ```text
//! Ready ──run()──▶ Running ──▶ Succeeded
//!                     │
//!                     └──────▶ Failed(reason)
//! ```
//!
//! `Running` is entered before anything else so a job that dies mid-crawl is
//! visible as stuck rather than never started. Configuration problems fail the
//! job before any request is made. Discovery failures fail the job. Failures
//! fetching individual links are logged and skipped; the job still succeeds.

use crate::discovery::{DiscoveryMode, LinkDiscovery, SelectorDiscovery, AiAssistedDiscovery};
use crate::fetcher::PageFetcher;
use crate::models::{CrawlResultRecord, RecordStatus};
use crate::utils::normalize_link;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// Problems with how a job was set up. Detected before any network access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobConfigError {
    #[error("crawler query cannot be empty")]
    EmptyQuery,
    #[error("crawler html selector cannot be empty")]
    EmptyHtmlSelector,
    #[error("crawler filled pages bodies needs to be empty")]
    FilledPageBodies,
}

/// Lifecycle state of a [`CrawlJob`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlStatus {
    Ready,
    Running,
    Succeeded,
    Failed(String),
}

impl CrawlStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CrawlStatus::Succeeded | CrawlStatus::Failed(_))
    }
}

/// One outlet's crawl attempt within a batch.
#[derive(Debug, Clone)]
pub struct CrawlJob {
    id: usize,
    outlet_name: String,
    query: String,
    html_selector: Option<String>,
    pages_to_visit: usize,
    status: CrawlStatus,
    page_bodies: Vec<String>,
    completed_at: Option<DateTime<Utc>>,
}

impl CrawlJob {
    /// Create a job in the `Ready` state with no collected bodies.
    pub fn new(
        id: usize,
        outlet_name: impl Into<String>,
        query: impl Into<String>,
        html_selector: Option<String>,
        pages_to_visit: usize,
    ) -> Self {
        Self {
            id,
            outlet_name: outlet_name.into(),
            query: query.into(),
            html_selector,
            pages_to_visit,
            status: CrawlStatus::Ready,
            page_bodies: Vec::new(),
            completed_at: None,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn outlet_name(&self) -> &str {
        &self.outlet_name
    }

    pub fn status(&self) -> &CrawlStatus {
        &self.status
    }

    #[cfg(test)]
    pub fn page_bodies(&self) -> &[String] {
        &self.page_bodies
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.status {
            CrawlStatus::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Build the discovery strategy this job runs under `mode`.
    pub fn discovery(&self, mode: &DiscoveryMode) -> LinkDiscovery {
        match mode {
            DiscoveryMode::Selector => LinkDiscovery::Selector(SelectorDiscovery::new(
                self.html_selector.clone().unwrap_or_default(),
            )),
            DiscoveryMode::AiAssisted { endpoint } => {
                LinkDiscovery::AiAssisted(AiAssistedDiscovery::new(endpoint))
            }
            #[cfg(test)]
            DiscoveryMode::Panicking => LinkDiscovery::Panicking,
        }
    }

    /// Run the job to a terminal status.
    #[instrument(level = "info", skip_all, fields(job_id = self.id, outlet = %self.outlet_name))]
    pub async fn run(&mut self, discovery: &LinkDiscovery, fetcher: &PageFetcher) {
        self.status = CrawlStatus::Running;
        info!(query = %self.query, pages_to_visit = self.pages_to_visit, "Crawler running");

        if let Err(e) = self.check_preconditions(discovery) {
            error!(reason = %e, "Crawler misconfigured; no requests made");
            self.finish(CrawlStatus::Failed(e.to_string()));
            return;
        }

        let links = match discovery
            .discover_links(fetcher, &self.query, self.pages_to_visit)
            .await
        {
            Ok(links) => links,
            Err(e) => {
                error!(error = %e, "Link discovery failed");
                self.finish(CrawlStatus::Failed(e.to_string()));
                return;
            }
        };

        // page_bodies never grows past pages_to_visit
        for link in links.into_iter().take(self.pages_to_visit) {
            let link = normalize_link(&link);
            match fetcher.fetch(&link).await {
                Ok(body) => {
                    self.page_bodies.push(body);
                    info!(%link, "Added page body");
                }
                Err(e) => warn!(%link, error = %e, "Skipping link"),
            }
        }

        info!(bodies = self.page_bodies.len(), "Crawler succeeded");
        self.finish(CrawlStatus::Succeeded);
    }

    fn check_preconditions(&self, discovery: &LinkDiscovery) -> Result<(), JobConfigError> {
        if self.query.trim().is_empty() {
            return Err(JobConfigError::EmptyQuery);
        }
        let selector_blank = self
            .html_selector
            .as_deref()
            .is_none_or(|s| s.trim().is_empty());
        if matches!(discovery, LinkDiscovery::Selector(_)) && selector_blank {
            return Err(JobConfigError::EmptyHtmlSelector);
        }
        if !self.page_bodies.is_empty() {
            return Err(JobConfigError::FilledPageBodies);
        }
        Ok(())
    }

    fn finish(&mut self, status: CrawlStatus) {
        self.status = status;
        self.completed_at = Some(Utc::now());
    }

    /// Project the job into its persisted form.
    pub fn to_record(&self) -> CrawlResultRecord {
        let status = match self.status {
            CrawlStatus::Ready => RecordStatus::Ready,
            CrawlStatus::Running => RecordStatus::Running,
            CrawlStatus::Succeeded => RecordStatus::Succeeded,
            CrawlStatus::Failed(_) => RecordStatus::Failed,
        };
        CrawlResultRecord {
            id: self.id,
            outlet_name: self.outlet_name.clone(),
            pages_to_visit: self.pages_to_visit,
            query: self.query.clone(),
            html_selector: self.html_selector.clone(),
            status,
            failure_reason: self.failure_reason().map(str::to_string),
            page_bodies: self.page_bodies.clone(),
            completed_at: self.completed_at.map(|t| t.to_rfc3339()),
        }
    }
}
