//! # Outlet Crawler
//!
//! A bounded, concurrent crawler that gathers candidate article bodies from a
//! set of news outlets for a search query, so the articles can later be used
//! to fact-check a claim.
//!
//! ## Usage
//!
//! ```sh
//! outlet_crawler crawl -o outlets.yaml -q "fish prices" -p 3
//! outlet_crawler results
//! ```
//!
//! ## Architecture
//!
//! 1. **Templating**: render each outlet's search URL from the query
//! 2. **Discovery**: find candidate article links on the search page, either
//!    with the outlet's CSS selector or through the link-extraction service
//! 3. **Fetching**: download up to `pages_to_visit` article bodies per outlet,
//!    skipping links that fail
//! 4. **Output**: append the batch to the `results` log as one JSON array
//!
//! Every outlet is crawled in its own task; the batch completes when all of
//! them have reached a terminal status.

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod discovery;
mod fetcher;
mod job;
mod models;
mod orchestrator;
mod query;
mod sink;
mod utils;

use cli::{Cli, Command, CrawlArgs, Strategy};
use discovery::DiscoveryMode;
use fetcher::PageFetcher;
use models::{NewsOutlet, RecordStatus};
use orchestrator::CrawlOrchestrator;
use sink::ResultSink;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("outlet_crawler starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    match args.command {
        Command::Crawl(crawl_args) => run_crawl(crawl_args).await?,
        Command::Results { results } => show_results(&results).await?,
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

#[instrument(level = "info", skip_all, fields(outlets = %args.outlets, strategy = ?args.strategy))]
async fn run_crawl(args: CrawlArgs) -> Result<(), Box<dyn Error>> {
    let outlets = load_outlets(&args.outlets).await?;
    info!(count = outlets.len(), "Loaded news outlets");

    let mode = match args.strategy {
        Strategy::Selector => DiscoveryMode::Selector,
        Strategy::Ai => DiscoveryMode::AiAssisted {
            endpoint: args.ai_analyzer_url.clone(),
        },
    };
    let fetcher = PageFetcher::new(Duration::from_secs(args.timeout_secs))?;
    let orchestrator = CrawlOrchestrator::new(fetcher, mode, ResultSink::new(&args.results));

    let report = orchestrator
        .crawl(&outlets, usize::from(args.pages_to_visit), &args.query)
        .await;

    println!(
        "jobs: {}  succeeded: {}  failed: {}  bodies: {}  saved: {}",
        report.records.len(),
        report.succeeded(),
        report.failed(),
        report.bodies_collected(),
        if report.persisted { args.results.as_str() } else { "no" },
    );
    for record in &report.records {
        if let Some(reason) = &record.failure_reason {
            println!("  #{} {}: {}", record.id, record.outlet_name, reason);
        }
    }
    Ok(())
}

/// Read the outlet snapshot. JSON files parse too, since JSON is valid YAML.
#[instrument(level = "info", skip_all, fields(%path))]
async fn load_outlets(path: &str) -> Result<Vec<NewsOutlet>, Box<dyn Error>> {
    let raw = tokio::fs::read_to_string(path).await?;
    let outlets: Vec<NewsOutlet> = serde_yaml::from_str(&raw)?;
    Ok(outlets)
}

async fn show_results(path: &str) -> Result<(), Box<dyn Error>> {
    let batches = ResultSink::new(path).load().await?;
    if batches.is_empty() {
        println!("no batches in {path}");
        return Ok(());
    }

    for (i, batch) in batches.iter().enumerate() {
        let succeeded = batch
            .iter()
            .filter(|r| r.status == RecordStatus::Succeeded)
            .count();
        let failed = batch
            .iter()
            .filter(|r| r.status == RecordStatus::Failed)
            .count();
        let bodies: usize = batch.iter().map(|r| r.page_bodies.len()).sum();
        println!(
            "batch {}: jobs: {}  succeeded: {}  failed: {}  bodies: {}",
            i + 1,
            batch.len(),
            succeeded,
            failed,
            bodies
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_outlets_from_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("outlets.yaml");
        std::fs::write(
            &path,
            "- name: A\n  queryUrl: http://a.test/search?q=QUERY_HERE\n  htmlSelector: a.result\n\
             - name: B\n  queryUrlTemplate: http://b.test/KEYWORDS_HERE\n  language: pt\n",
        )
        .unwrap();

        let outlets = load_outlets(path.to_str().unwrap()).await.unwrap();
        assert_eq!(outlets.len(), 2);
        assert_eq!(outlets[0].html_selector, "a.result");
        assert_eq!(outlets[1].query_url, "http://b.test/KEYWORDS_HERE");
        assert_eq!(outlets[1].language, "pt");
    }

    #[tokio::test]
    async fn test_load_outlets_from_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("outlets.json");
        std::fs::write(
            &path,
            r#"[{"id": 1, "name": "A", "queryUrl": "http://a.test/?q=QUERY_HERE", "htmlSelector": "h3 a", "credibility": 4}]"#,
        )
        .unwrap();

        let outlets = load_outlets(path.to_str().unwrap()).await.unwrap();
        assert_eq!(outlets[0].id, 1);
        assert_eq!(outlets[0].credibility, 4);
    }

    #[tokio::test]
    async fn test_load_outlets_missing_file_is_an_error() {
        assert!(load_outlets("/definitely/not/here.yaml").await.is_err());
    }
}
