//! # News Harvest
//!
//! Collects news headlines, links and descriptions from public news sites
//! and normalizes them into [`Article`] records for a downstream consumer.
//!
//! ## Architecture
//!
//! Every source runs through the same pipeline:
//! 1. **Planning**: validate the category and build the listing requests,
//!    probing the first page for a page count when no end page is given
//! 2. **Fetching**: fetch all listing pages with bounded concurrency
//! 3. **Extracting**: pull article cards out of each HTML or JSON body
//! 4. **Normalizing**: map cards onto articles, dropping incomplete ones
//! 5. **Enriching** (optional): fetch each article page for its description
//!
//! Site knowledge lives in [`sources`]; the pipeline only talks to the
//! [`SourceAdapter`] trait and an [`HttpGet`] transport.
//!
//! ```no_run
//! # async fn demo() -> Result<(), news_harvest::ScrapeError> {
//! use news_harvest::{HttpFetcher, ScrapeRequest, scrape, sources::HuffPost};
//! use std::time::Duration;
//!
//! let http = HttpFetcher::new(Duration::from_secs(30), "news_harvest")?;
//! let source = HuffPost::new(100);
//! let report = scrape(&http, &source, &ScrapeRequest::new("good").pages(None, Some(1))).await?;
//! println!("{} articles", report.articles.len());
//! # Ok(()) }
//! ```

pub mod config;
pub mod enricher;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod models;
pub mod normalizer;
pub mod outputs;
pub mod pipeline;
pub mod sources;
pub mod utils;

pub use error::ScrapeError;
pub use fetcher::{HttpFetcher, HttpGet, fetch_batch};
pub use models::{Article, Diagnostic, FetchFailure, FetchRequest, FetchResult, ScrapeReport, Stage};
pub use pipeline::{Pipeline, ScrapeRequest, scrape};
pub use sources::{SourceAdapter, SourceKind, SourceOptions};
