//! Data models shared by every stage of the pipeline.
//!
//! - [`Article`]: the canonical output record handed to callers
//! - [`FetchRequest`] / [`FetchResult`]: one HTTP GET and its outcome
//! - [`Card`]: a source-specific bag of fields between extraction and
//!   normalization
//! - [`Diagnostic`] / [`ScrapeReport`]: typed account of what a run skipped

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// A normalized news article.
///
/// `headline` and `url` are guaranteed non-empty and `url` is absolute;
/// the only way to build one is [`Article::new`], which checks both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    headline: String,
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    category: String,
}

/// Which required field an [`Article`] could not be built without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Headline,
    Url,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingField::Headline => f.write_str("headline"),
            MissingField::Url => f.write_str("url"),
        }
    }
}

impl Article {
    /// Build an article, collapsing whitespace in the text fields.
    ///
    /// Fails when the headline is blank or `url` is not an absolute URL.
    /// A blank description is stored as `None`.
    pub fn new(
        headline: &str,
        url: &str,
        description: Option<&str>,
        category: &str,
    ) -> Result<Self, MissingField> {
        let headline = collapse_whitespace(headline);
        if headline.is_empty() {
            return Err(MissingField::Headline);
        }
        let url = Url::parse(url.trim()).map_err(|_| MissingField::Url)?;
        Ok(Self {
            headline,
            url: url.to_string(),
            description: description.map(collapse_whitespace).filter(|d| !d.is_empty()),
            category: category.to_string(),
        })
    }

    pub fn headline(&self) -> &str {
        &self.headline
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Set the description; blank text leaves the current value untouched.
    pub fn set_description(&mut self, description: &str) {
        let description = collapse_whitespace(description);
        if !description.is_empty() {
            self.description = Some(description);
        }
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One HTTP GET: a URL plus query parameters appended at send time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

/// Why a single request produced no usable body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// The server answered with a status >= 400.
    HttpStatus(u16),
    /// Connection, TLS, redirect or body-read failure.
    Network(String),
    Timeout,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::HttpStatus(code) => write!(f, "http error {code}"),
            FetchFailure::Network(msg) => write!(f, "network error: {msg}"),
            FetchFailure::Timeout => f.write_str("timeout"),
        }
    }
}

/// Outcome of one [`FetchRequest`], matched to it by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Success { status_code: u16, body: String },
    Failure { reason: FetchFailure },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success { .. })
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            FetchResult::Success { body, .. } => Some(body),
            FetchResult::Failure { .. } => None,
        }
    }
}

/// Field names the normalizer reads out of a [`Card`].
pub mod fields {
    pub const HEADLINE: &str = "headline";
    pub const URL: &str = "url";
    pub const DESCRIPTION: &str = "description";
}

/// Raw fields pulled out of one listing entry, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Card {
    fields: BTreeMap<String, String>,
}

impl Card {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Pipeline stages, in the order a run moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Planning,
    Probing,
    Fetching,
    Extracting,
    Normalizing,
    Enriching,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Planning => "planning",
            Stage::Probing => "probing",
            Stage::Fetching => "fetching",
            Stage::Extracting => "extracting",
            Stage::Normalizing => "normalizing",
            Stage::Enriching => "enriching",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// A recovered, per-item problem encountered during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A listing page could not be fetched.
    FetchFailed { url: String, reason: FetchFailure },
    /// A listing page parsed but held no cards.
    ExtractionGap { url: String },
    /// A card lacked a headline or usable URL and was dropped.
    MissingRequiredField { page_url: String, field: MissingField },
    /// A second card pointed at an article already collected.
    DuplicateArticle { url: String },
    /// The detail page of an article could not be fetched.
    EnrichmentFailed { url: String, reason: FetchFailure },
    /// The detail page was fetched but had no description.
    DescriptionNotFound { url: String },
    /// Every request of a stage failed.
    TotalFetchFailure { stage: Stage, attempted: usize },
}

/// Articles produced by a run plus everything that was skipped on the way.
#[derive(Debug, Clone, Default)]
pub struct ScrapeReport {
    pub articles: Vec<Article>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ScrapeReport {
    pub fn fetch_failures(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::FetchFailed { .. }))
            .count()
    }
}
