//! Per-site adapters plugged into the pipeline.
//!
//! Each adapter knows how one site paginates its listings, where the
//! article cards sit in a listing body, and where an article page keeps its
//! description. The pipeline itself knows none of this.
//!
//! # Supported Sources
//!
//! | Source | Module | Body | Bound discovery | Descriptions |
//! |--------|--------|------|-----------------|--------------|
//! | Good News Network | [`goodnewsnetwork`] | HTML | yes | `og:description` on article page |
//! | HuffPost | [`huffpost`] | JSON | no (one page by default) | inline in listing |
//! | Newser | [`newser`] | HTML fragment | no | `#divDeck` on article page |

use crate::error::ScrapeError;
use crate::extractor::{DescriptionSelector, SelectorStrategy};
use crate::models::FetchRequest;
use clap::ValueEnum;
use std::fmt;
use url::Url;

pub mod goodnewsnetwork;
pub mod huffpost;
pub mod newser;

pub use goodnewsnetwork::GoodNewsNetwork;
pub use huffpost::HuffPost;
pub use newser::Newser;

/// Site-specific knowledge the pipeline consumes.
pub trait SourceAdapter {
    fn name(&self) -> &'static str;

    fn allowed_categories(&self) -> &'static [&'static str];

    /// Case-insensitive membership in [`allowed_categories`](Self::allowed_categories).
    fn validate_category(&self, category: &str) -> bool {
        self.allowed_categories()
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category))
    }

    fn first_page(&self) -> u32 {
        1
    }

    /// The listing request for `page` of `category`.
    fn page_request(&self, page: u32, category: &str) -> FetchRequest;

    /// Whether [`extract_bound`](Self::extract_bound) can find a page count.
    fn supports_bound_discovery(&self) -> bool {
        false
    }

    /// Total number of listing pages, read from a probe of the first page.
    fn extract_bound(&self, _probe_body: &str) -> Option<u32> {
        None
    }

    /// Whether a run that names no end page and cannot discover one fetches
    /// just its start page instead of failing.
    fn defaults_to_single_page(&self) -> bool {
        false
    }

    fn selector_strategy(&self) -> &SelectorStrategy;

    fn description_selector(&self) -> Option<&DescriptionSelector> {
        None
    }

    /// Base for resolving relative article links.
    fn base_url(&self) -> Option<&Url> {
        None
    }

    /// Category tag written onto every article from `category`.
    fn article_tag(&self, category: &str) -> String {
        category.to_ascii_lowercase()
    }
}

/// Sizing knobs for the sources that page by item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceOptions {
    /// HuffPost cards per listing request.
    pub huffpost_page_size: u32,
    /// Newser articles per listing request (rounded up to a multiple of 3).
    pub newser_articles_per_request: u32,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            huffpost_page_size: 100,
            newser_articles_per_request: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    Goodnewsnetwork,
    Huffpost,
    Newser,
}

impl SourceKind {
    pub fn build(self, options: &SourceOptions) -> Result<Box<dyn SourceAdapter>, ScrapeError> {
        Ok(match self {
            SourceKind::Goodnewsnetwork => Box::new(GoodNewsNetwork::new()?),
            SourceKind::Huffpost => Box::new(HuffPost::new(options.huffpost_page_size)),
            SourceKind::Newser => Box::new(Newser::new(options.newser_articles_per_request)?),
        })
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Goodnewsnetwork => "goodnewsnetwork",
            SourceKind::Huffpost => "huffpost",
            SourceKind::Newser => "newser",
        };
        f.write_str(name)
    }
}
