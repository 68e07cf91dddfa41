//! Structural failures of a scrape run.
//!
//! Per-request and per-card problems are *not* errors: they travel as
//! [`FetchResult`](crate::models::FetchResult) values and
//! [`Diagnostic`](crate::models::Diagnostic) entries in the run report.
//! [`ScrapeError`] is reserved for conditions that make a run impossible or
//! leave nothing to return.

use crate::models::Stage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid category '{category}' for {source_name}, expected one of {allowed:?}")]
    InvalidCategory {
        source_name: &'static str,
        category: String,
        allowed: Vec<&'static str>,
    },
    #[error(
        "invalid page range: start {start}, end {end:?} (first page is {first}, at most {max} pages per run)",
        max = crate::pipeline::MAX_PAGES_PER_RUN
    )]
    InvalidPageRange {
        start: u32,
        end: Option<u32>,
        first: u32,
    },
    #[error("could not determine page count for {source_name}: {reason}")]
    PageBoundUnavailable {
        source_name: &'static str,
        reason: String,
    },
    #[error("all {attempted} requests failed during {stage}")]
    TotalFetchFailure { stage: Stage, attempted: usize },
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
