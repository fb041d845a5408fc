//! Data models crossing the crawler's boundaries.
//!
//! - [`NewsOutlet`]: an outlet record as handed over by the storage layer
//! - [`CrawlResultRecord`]: the persisted projection of a finished crawl job
//!
//! Both use camelCase field names to match the JSON produced and consumed by
//! the rest of the fact-checking system.

use serde::{Deserialize, Serialize};

/// A news outlet the crawler can search.
///
/// The crawler only reads a snapshot of these per batch. `query_url` holds a
/// search URL template with a `QUERY_HERE` or `KEYWORDS_HERE` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsOutlet {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(alias = "queryUrlTemplate")]
    pub query_url: String,
    #[serde(default)]
    pub html_selector: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub credibility: i32,
}

/// Coarse job state as written to the result log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Ready,
    Running,
    Succeeded,
    Failed,
}

/// One job's entry in a persisted batch.
///
/// Each append to the result log is a JSON array of these.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResultRecord {
    pub id: usize,
    pub outlet_name: String,
    pub pages_to_visit: usize,
    pub query: String,
    pub html_selector: Option<String>,
    pub status: RecordStatus,
    pub failure_reason: Option<String>,
    pub page_bodies: Vec<String>,
    /// RFC 3339 timestamp of the terminal transition, if one happened.
    pub completed_at: Option<String>,
}
