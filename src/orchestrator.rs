//! Batch orchestration.
//!
//! [`CrawlOrchestrator::crawl`] turns an outlet snapshot into one [`CrawlJob`]
//! per outlet, runs every job as its own tokio task, waits on a [`JoinSet`]
//! until all of them are done and appends the batch to the result log.
//!
//! There is no limit on how many jobs run at once: one task per outlet. Each
//! request is bounded by the fetcher's timeout, but nothing bounds the batch
//! as a whole.

use crate::discovery::DiscoveryMode;
use crate::fetcher::PageFetcher;
use crate::job::CrawlJob;
use crate::models::{CrawlResultRecord, NewsOutlet, RecordStatus};
use crate::query::build_query_url;
use crate::sink::ResultSink;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};

/// Outcome of one [`CrawlOrchestrator::crawl`] call.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Terminal records, in completion order.
    pub records: Vec<CrawlResultRecord>,
    /// Whether the batch reached the result log.
    pub persisted: bool,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.count(RecordStatus::Succeeded)
    }

    pub fn failed(&self) -> usize {
        self.count(RecordStatus::Failed)
    }

    pub fn bodies_collected(&self) -> usize {
        self.records.iter().map(|r| r.page_bodies.len()).sum()
    }

    fn count(&self, status: RecordStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }
}

/// Runs crawl batches against a set of outlets.
#[derive(Debug, Clone)]
pub struct CrawlOrchestrator {
    fetcher: PageFetcher,
    mode: DiscoveryMode,
    sink: ResultSink,
}

impl CrawlOrchestrator {
    pub fn new(fetcher: PageFetcher, mode: DiscoveryMode, sink: ResultSink) -> Self {
        Self {
            fetcher,
            mode,
            sink,
        }
    }

    /// Build one job per outlet whose search URL renders.
    ///
    /// Job ids are the outlet's 1-based position in `outlets`, so skipped
    /// outlets leave gaps in the sequence.
    pub fn build_jobs(&self, outlets: &[NewsOutlet], pages_to_visit: usize, query: &str) -> Vec<CrawlJob> {
        outlets
            .iter()
            .enumerate()
            .filter_map(|(i, outlet)| {
                let Some(query_url) = build_query_url(&outlet.name, query, &outlet.query_url) else {
                    warn!(outlet = %outlet.name, "Skipping outlet; could not build query url");
                    return None;
                };
                let selector = match &self.mode {
                    DiscoveryMode::Selector => Some(outlet.html_selector.clone()),
                    _ => None,
                };
                Some(CrawlJob::new(i + 1, outlet.name.trim(), query_url, selector, pages_to_visit))
            })
            .collect()
    }

    /// Crawl every outlet for `query`, collecting up to `pages_to_visit`
    /// bodies per outlet, and persist the batch.
    #[instrument(level = "info", skip_all, fields(outlets = outlets.len(), pages_to_visit = pages_to_visit, %query))]
    pub async fn crawl(&self, outlets: &[NewsOutlet], pages_to_visit: usize, query: &str) -> BatchReport {
        let jobs = self.build_jobs(outlets, pages_to_visit, query);
        if jobs.is_empty() {
            error!("no crawlers were initialized");
            return BatchReport::default();
        }

        info!(jobs = jobs.len(), "Launching crawlers");
        let mut set = JoinSet::new();
        for mut job in jobs {
            let fetcher = self.fetcher.clone();
            let discovery = job.discovery(&self.mode);
            set.spawn(async move {
                info!(job_id = job.id(), outlet = %job.outlet_name(), "Initializing crawler");
                // A panic leaves the job in Running, which is reported as-is
                let outcome = AssertUnwindSafe(job.run(&discovery, &fetcher))
                    .catch_unwind()
                    .await;
                if outcome.is_err() {
                    error!(
                        job_id = job.id(),
                        outlet = %job.outlet_name(),
                        stuck = !job.status().is_terminal(),
                        "Crawler panicked"
                    );
                }
                job.to_record()
            });
        }

        let mut records = Vec::with_capacity(set.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(record) => records.push(record),
                Err(e) => error!(error = %e, "Crawler task did not complete"),
            }
        }

        let mut report = BatchReport {
            records,
            persisted: false,
        };
        info!(
            jobs = report.records.len(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            bodies = report.bodies_collected(),
            "All crawlers finished"
        );

        match self.sink.save(&report.records).await {
            Ok(()) => report.persisted = true,
            Err(e) => error!(error = %e, "Failed to save crawl results"),
        }
        report
    }
}
