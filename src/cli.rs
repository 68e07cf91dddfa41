//! Command-line interface definitions for News Harvest.
//!
//! Tuning options can also come from environment variables or a YAML file
//! passed with `--config`; explicit flags win over both.

use clap::Parser;
use news_harvest::config::HarvestConfig;
use news_harvest::{SourceKind, SourceOptions};
use std::num::NonZeroUsize;

/// Command-line arguments for the News Harvest application.
///
/// # Examples
///
/// ```sh
/// # Every Good News Network page in the "animals" category, with descriptions
/// news_harvest -s goodnewsnetwork -c animals -d -o ./out
///
/// # First 100 HuffPost "bad news" cards
/// news_harvest -s huffpost -c bad -o ./out
///
/// # Five Newser windows of 30 articles each
/// news_harvest -s newser -c bad --end-page 5 --articles-per-request 30 -d -o ./out
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// News source to scrape
    #[arg(short, long, value_enum)]
    pub source: SourceKind,

    /// Category to scrape (allowed values depend on the source)
    #[arg(short, long)]
    pub category: String,

    /// First listing page to fetch
    #[arg(long)]
    pub start_page: Option<u32>,

    /// Last listing page to fetch (inclusive). When omitted, goodnewsnetwork
    /// discovers it, huffpost fetches one page and newser refuses to run
    #[arg(long)]
    pub end_page: Option<u32>,

    /// Fetch each article page for its description
    #[arg(short, long)]
    pub descriptions: bool,

    /// Output directory for the JSON file
    #[arg(short, long)]
    pub output_dir: String,

    /// Optional path to a YAML config file
    #[arg(long, env = "NEWS_HARVEST_CONFIG")]
    pub config: Option<String>,

    /// Listing requests in flight at once
    #[arg(short = 'n', long, env = "NEWS_HARVEST_CONCURRENCY")]
    pub concurrency: Option<NonZeroUsize>,

    /// Article page requests in flight at once
    #[arg(long, env = "NEWS_HARVEST_ENRICH_CONCURRENCY")]
    pub enrich_concurrency: Option<NonZeroUsize>,

    /// Per-request timeout in seconds
    #[arg(long, env = "NEWS_HARVEST_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// User-Agent header sent with every request
    #[arg(long, env = "NEWS_HARVEST_USER_AGENT")]
    pub user_agent: Option<String>,

    /// HuffPost cards per page
    #[arg(long, default_value_t = 100)]
    pub page_size: u32,

    /// Newser articles per request (rounded up to a multiple of 3)
    #[arg(long, default_value_t = 30)]
    pub articles_per_request: u32,
}

impl Cli {
    /// Override `config` with whichever tuning flags were given.
    pub fn apply_to(&self, config: &mut HarvestConfig) {
        if let Some(n) = self.concurrency {
            config.concurrency = n;
        }
        if let Some(n) = self.enrich_concurrency {
            config.enrich_concurrency = n;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
        if let Some(ref agent) = self.user_agent {
            config.user_agent = agent.clone();
        }
    }

    pub fn source_options(&self) -> SourceOptions {
        SourceOptions {
            huffpost_page_size: self.page_size,
            newser_articles_per_request: self.articles_per_request,
        }
    }
}
