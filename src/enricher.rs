//! Filling in article descriptions from each article's own page.
//!
//! Enrichment only ever adds data. An article whose detail page fails to
//! load, or carries no description, is returned unchanged and the problem
//! is recorded as a [`Diagnostic`].

use crate::extractor::DescriptionSelector;
use crate::fetcher::{HttpGet, fetch_batch};
use crate::models::{Article, Diagnostic, FetchRequest, FetchResult, Stage};
use std::num::NonZeroUsize;
use tracing::{info, instrument, warn};

/// Articles after enrichment, in input order, plus what went wrong.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub articles: Vec<Article>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug)]
pub struct Enricher<'a, G> {
    http: &'a G,
    selector: &'a DescriptionSelector,
}

impl<'a, G: HttpGet> Enricher<'a, G> {
    pub fn new(http: &'a G, selector: &'a DescriptionSelector) -> Self {
        Self { http, selector }
    }

    /// Fetch the page of every article that lacks a description and merge
    /// what the selector finds there.
    ///
    /// The output always has the same length and order as `articles`.
    #[instrument(level = "info", skip_all, fields(articles = articles.len()))]
    pub async fn enrich(
        &self,
        mut articles: Vec<Article>,
        concurrency_limit: NonZeroUsize,
    ) -> Enrichment {
        let pending: Vec<usize> = articles
            .iter()
            .enumerate()
            .filter(|(_, a)| a.description().is_none())
            .map(|(i, _)| i)
            .collect();
        let requests: Vec<FetchRequest> = pending
            .iter()
            .map(|&i| FetchRequest::new(articles[i].url()))
            .collect();

        let results = fetch_batch(self.http, &requests, concurrency_limit).await;

        let mut diagnostics = Vec::new();
        let mut fetched = 0usize;
        let mut described = 0usize;
        for (&index, result) in pending.iter().zip(results) {
            let article = &mut articles[index];
            match result {
                FetchResult::Success { body, .. } => {
                    fetched += 1;
                    match self.selector.find(&body) {
                        Some(description) => {
                            article.set_description(&description);
                            described += 1;
                        }
                        None => {
                            warn!(url = %article.url(), "No description found on article page");
                            diagnostics.push(Diagnostic::DescriptionNotFound {
                                url: article.url().to_string(),
                            });
                        }
                    }
                }
                FetchResult::Failure { reason } => {
                    warn!(url = %article.url(), %reason, "Could not fetch article page");
                    diagnostics.push(Diagnostic::EnrichmentFailed {
                        url: article.url().to_string(),
                        reason,
                    });
                }
            }
        }

        if !requests.is_empty() && fetched == 0 {
            warn!(attempted = requests.len(), "Every article page fetch failed");
            diagnostics.push(Diagnostic::TotalFetchFailure {
                stage: Stage::Enriching,
                attempted: requests.len(),
            });
        }

        info!(
            requested = requests.len(),
            fetched,
            described,
            "Enrichment complete"
        );
        Enrichment {
            articles,
            diagnostics,
        }
    }
}
