//! Command-line interface definitions for the outlet crawler.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Network and storage settings can also be provided via environment variables.

use crate::discovery::DEFAULT_AI_ANALYZER_URL;
use crate::fetcher::DEFAULT_FETCH_TIMEOUT;
use crate::sink::DEFAULT_RESULTS_PATH;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for the outlet crawler.
///
/// # Examples
///
/// ```sh
/// # Search every outlet in outlets.yaml, keeping 3 articles per outlet
/// outlet_crawler crawl -o outlets.yaml -q "fish prices" -p 3
///
/// # Let the link-extraction service pick the article links
/// outlet_crawler crawl -o outlets.yaml -q "fish prices" --strategy ai \
///     --ai-analyzer-url http://localhost:7654
///
/// # Summarize what has been collected so far
/// outlet_crawler results
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Crawl every outlet for a query and append the batch to the result log
    Crawl(CrawlArgs),
    /// Summarize the batches stored in the result log
    Results {
        /// Path of the result log
        #[arg(short, long, env = "CRAWL_RESULTS_PATH", default_value = DEFAULT_RESULTS_PATH)]
        results: String,
    },
}

/// How candidate article links are found on each outlet's search page.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Scrape the `href` of elements matching the outlet's HTML selector
    Selector,
    /// Ask the link-extraction service to pick article links
    Ai,
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// YAML or JSON file holding the list of news outlets
    #[arg(short, long)]
    pub outlets: String,

    /// Free-text search query
    #[arg(short, long)]
    pub query: String,

    /// Maximum number of article pages to collect per outlet
    #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u16).range(1..))]
    pub pages_to_visit: u16,

    /// Link discovery strategy
    #[arg(short, long, value_enum, default_value_t = Strategy::Selector)]
    pub strategy: Strategy,

    /// Base URL of the link-extraction service
    #[arg(long, env = "AI_ANALYZER_URL", default_value = DEFAULT_AI_ANALYZER_URL)]
    pub ai_analyzer_url: String,

    /// Path of the result log
    #[arg(short, long, env = "CRAWL_RESULTS_PATH", default_value = DEFAULT_RESULTS_PATH)]
    pub results: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "CRAWL_FETCH_TIMEOUT_SECS", default_value_t = DEFAULT_FETCH_TIMEOUT.as_secs())]
    pub timeout_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crawl_args(cli: Cli) -> CrawlArgs {
        match cli.command {
            Command::Crawl(args) => args,
            other => panic!("expected crawl, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "outlet_crawler",
            "crawl",
            "--outlets",
            "./outlets.yaml",
            "--query",
            "fish",
        ]);
        let args = crawl_args(cli);

        assert_eq!(args.outlets, "./outlets.yaml");
        assert_eq!(args.query, "fish");
        assert_eq!(args.pages_to_visit, 5);
        assert_eq!(args.strategy, Strategy::Selector);
        assert_eq!(args.timeout_secs, 8);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "outlet_crawler",
            "crawl",
            "-o",
            "/tmp/outlets.json",
            "-q",
            "fish prices",
            "-p",
            "2",
            "-s",
            "ai",
            "-r",
            "/tmp/results",
        ]);
        let args = crawl_args(cli);

        assert_eq!(args.outlets, "/tmp/outlets.json");
        assert_eq!(args.query, "fish prices");
        assert_eq!(args.pages_to_visit, 2);
        assert_eq!(args.strategy, Strategy::Ai);
        assert_eq!(args.results, "/tmp/results");
    }

    #[test]
    fn test_cli_rejects_zero_pages() {
        let parsed = Cli::try_parse_from([
            "outlet_crawler",
            "crawl",
            "-o",
            "outlets.yaml",
            "-q",
            "fish",
            "-p",
            "0",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_cli_results_subcommand() {
        let cli = Cli::parse_from(["outlet_crawler", "results", "-r", "/tmp/results"]);
        match cli.command {
            Command::Results { results } => assert_eq!(results, "/tmp/results"),
            other => panic!("expected results, got {other:?}"),
        }
    }
}
