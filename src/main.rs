//! # News Harvest
//!
//! Scrapes news headlines, links and descriptions from one public news site
//! per run and writes them to a JSON file for downstream classification.
//!
//! ## Usage
//!
//! ```sh
//! news_harvest -s goodnewsnetwork -c animals -d -o ./out
//! ```
//!
//! ## Flow
//!
//! 1. **Configuration**: defaults, then the optional YAML file, then flags
//! 2. **Scrape**: run the source through the fetch-then-enrich pipeline
//! 3. **Output**: write the articles to `{output_dir}/{source}/{date}_{category}.json`

use clap::Parser;
use itertools::Itertools;
use news_harvest::config::HarvestConfig;
use news_harvest::outputs::json;
use news_harvest::utils::ensure_writable_dir;
use news_harvest::{Diagnostic, HttpFetcher, ScrapeRequest, scrape};
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::Cli;

#[tokio::main]
#[instrument]
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
    info!("news_harvest starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = match args.config {
        Some(ref path) => HarvestConfig::load(path).await?,
        None => HarvestConfig::default(),
    };
    args.apply_to(&mut config);

    // Fail before any network traffic if the output can't be written.
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    let source = args.source.build(&args.source_options())?;
    let http = HttpFetcher::new(config.timeout(), &config.user_agent)?;
    let request = ScrapeRequest::new(&args.category)
        .pages(args.start_page, args.end_page)
        .concurrency(config.concurrency)
        .enrich_concurrency(Some(config.enrich_concurrency))
        .with_descriptions(args.descriptions);

    let report = match scrape(&http, source.as_ref(), &request).await {
        Ok(report) => report,
        Err(e) => {
            error!(source = %args.source, category = %args.category, error = %e, "Scrape failed");
            return Err(e.into());
        }
    };

    for diagnostic in &report.diagnostics {
        debug!(?diagnostic, "Diagnostic");
    }
    let counts = report.diagnostics.iter().counts_by(diagnostic_kind);
    if !counts.is_empty() {
        warn!(?counts, "Run finished with skipped items");
    }
    if let Some(Diagnostic::TotalFetchFailure { stage, attempted }) = report
        .diagnostics
        .iter()
        .find(|d| matches!(d, Diagnostic::TotalFetchFailure { .. }))
    {
        warn!(%stage, attempted, "Every request of a stage failed; results are partial");
    }

    let described = report
        .articles
        .iter()
        .filter(|a| a.description().is_some())
        .count();
    info!(
        articles = report.articles.len(),
        described,
        failed_pages = report.fetch_failures(),
        "Collected articles"
    );

    let path = json::write_articles(
        &report.articles,
        &args.output_dir,
        &args.source.to_string(),
        &args.category,
    )
    .await?;
    info!(path = %path.display(), "Wrote output");

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

fn diagnostic_kind(diagnostic: &Diagnostic) -> &'static str {
    match diagnostic {
        Diagnostic::FetchFailed { .. } => "fetch_failed",
        Diagnostic::ExtractionGap { .. } => "extraction_gap",
        Diagnostic::MissingRequiredField { .. } => "missing_required_field",
        Diagnostic::DuplicateArticle { .. } => "duplicate_article",
        Diagnostic::EnrichmentFailed { .. } => "enrichment_failed",
        Diagnostic::DescriptionNotFound { .. } => "description_not_found",
        Diagnostic::TotalFetchFailure { .. } => "total_fetch_failure",
    }
}
