//! Append-only result log.
//!
//! Every completed batch is written as one indented JSON array followed by a
//! newline. Nothing is ever rewritten, so the log reads as a sequence of
//! batches:
//!
//! ```text
//! [
//!   { "id": 1, "outletName": "A", "status": "succeeded", ... },
//!   { "id": 2, "outletName": "B", "status": "failed", ... }
//! ]
//! [
//!   ...
//! ]
//! ```

use crate::models::CrawlResultRecord;
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

/// Default result log location, relative to the working directory.
pub const DEFAULT_RESULTS_PATH: &str = "results";

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("unable to serialize JSON: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("unable to open file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to write file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to read file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse results in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Persists completed batches to the result log.
#[derive(Debug, Clone)]
pub struct ResultSink {
    path: PathBuf,
}

impl ResultSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append `batch` to the log as a single indented JSON array.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), jobs = batch.len()))]
    pub async fn save(&self, batch: &[CrawlResultRecord]) -> Result<(), SinkError> {
        let json = serde_json::to_string_pretty(batch).map_err(SinkError::Serialize)?;
        let path = self.path.display().to_string();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| SinkError::Open {
                path: path.clone(),
                source,
            })?;

        file.write_all(json.as_bytes())
            .await
            .map_err(|source| SinkError::Write {
                path: path.clone(),
                source,
            })?;
        file.write_all(b"\n")
            .await
            .map_err(|source| SinkError::Write {
                path: path.clone(),
                source,
            })?;
        file.flush()
            .await
            .map_err(|source| SinkError::Write { path, source })?;

        info!(bytes = json.len() + 1, "Appended batch to result log");
        Ok(())
    }

    /// Read every batch back from the log, oldest first.
    ///
    /// A missing log is treated as empty.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<Vec<Vec<CrawlResultRecord>>, SinkError> {
        let path = self.path.display().to_string();
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(SinkError::Read { path, source }),
        };

        serde_json::Deserializer::from_str(&contents)
            .into_iter::<Vec<CrawlResultRecord>>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| SinkError::Parse { path, source })
    }
}
