//! The scrape run: plan → fetch → extract → normalize → enrich.
//!
//! A run moves through [`Stage`]s strictly in order and keeps no state once
//! it returns. Per-item problems (a failed page, an empty page, a card
//! without a link, an unreachable article) are recovered on the spot and
//! reported as [`Diagnostic`]s next to the articles. Only structural
//! failures end a run with a [`ScrapeError`]:
//!
//! - the category is not one the source accepts (checked before any I/O)
//! - the page range is empty or the page count cannot be discovered
//! - every listing request failed
//!
//! When no end page is given and the source can discover one, the first
//! page is probed and its "last page" indicator read before the main batch
//! is built. The probe response stands in for that page in the batch.

use crate::enricher::Enricher;
use crate::error::ScrapeError;
use crate::extractor::extract;
use crate::fetcher::{HttpGet, fetch_batch};
use crate::models::{Article, Card, Diagnostic, FetchRequest, FetchResult, ScrapeReport, Stage};
use crate::normalizer::Normalizer;
use crate::sources::SourceAdapter;
use crate::utils::truncate_for_log;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use tracing::{debug, info, instrument, warn};

/// Listing requests in flight when a run does not say otherwise.
pub const DEFAULT_CONCURRENCY: NonZeroUsize = NonZeroUsize::new(10).unwrap();

/// Most listing pages a single run will request.
pub const MAX_PAGES_PER_RUN: u32 = 10_000;

/// What to scrape and how hard to push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    pub category: String,
    /// First page to fetch; the source's first page when `None`.
    pub start_page: Option<u32>,
    /// Last page to fetch, inclusive; discovered by probing when `None`.
    pub end_page: Option<u32>,
    pub concurrency_limit: NonZeroUsize,
    /// Limit for article page fetches; `concurrency_limit` when `None`.
    pub enrich_concurrency: Option<NonZeroUsize>,
    pub include_descriptions: bool,
}

impl ScrapeRequest {
    pub fn new(category: &str) -> Self {
        Self {
            category: category.to_string(),
            start_page: None,
            end_page: None,
            concurrency_limit: DEFAULT_CONCURRENCY,
            enrich_concurrency: None,
            include_descriptions: false,
        }
    }

    pub fn pages(mut self, start: Option<u32>, end: Option<u32>) -> Self {
        self.start_page = start;
        self.end_page = end;
        self
    }

    pub fn concurrency(mut self, limit: NonZeroUsize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    pub fn enrich_concurrency(mut self, limit: Option<NonZeroUsize>) -> Self {
        self.enrich_concurrency = limit;
        self
    }

    pub fn with_descriptions(mut self, include: bool) -> Self {
        self.include_descriptions = include;
        self
    }
}

/// One source wired to one transport.
pub struct Pipeline<'a, G, S: ?Sized> {
    http: &'a G,
    source: &'a S,
}

impl<'a, G, S> Pipeline<'a, G, S>
where
    G: HttpGet,
    S: SourceAdapter + ?Sized,
{
    pub fn new(http: &'a G, source: &'a S) -> Self {
        Self { http, source }
    }

    /// Run every stage for `request` and return the collected articles.
    #[instrument(
        level = "info",
        skip_all,
        fields(source = self.source.name(), category = %request.category)
    )]
    pub async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapeReport, ScrapeError> {
        let mut run = Run::default();

        run.advance(Stage::Planning);
        let Plan { requests, probed } = self.plan(request, &mut run).await?;

        run.advance(Stage::Fetching);
        let results = match probed {
            Some(first) => {
                debug!(url = %requests[0].url, "Reusing probe response for first page");
                let mut results = Vec::with_capacity(requests.len());
                results.push(first);
                let rest = fetch_batch(self.http, &requests[1..], request.concurrency_limit).await;
                results.extend(rest);
                results
            }
            None => fetch_batch(self.http, &requests, request.concurrency_limit).await,
        };
        if results.iter().all(|r| !r.is_success()) {
            warn!(attempted = results.len(), "Every listing request failed");
            return Err(ScrapeError::TotalFetchFailure {
                stage: Stage::Fetching,
                attempted: results.len(),
            });
        }

        run.advance(Stage::Extracting);
        let pages = self.extract_pages(&requests, results, &mut run);

        run.advance(Stage::Normalizing);
        let mut articles = self.normalize_pages(&request.category, pages, &mut run);

        if request.include_descriptions {
            match self.source.description_selector() {
                Some(selector) => {
                    run.advance(Stage::Enriching);
                    let limit = request
                        .enrich_concurrency
                        .unwrap_or(request.concurrency_limit);
                    let enrichment = Enricher::new(self.http, selector)
                        .enrich(articles, limit)
                        .await;
                    articles = enrichment.articles;
                    run.diagnostics.extend(enrichment.diagnostics);
                }
                None => debug!("Source has no description selector; skipping enrichment"),
            }
        }

        run.advance(Stage::Done);
        info!(
            articles = articles.len(),
            diagnostics = run.diagnostics.len(),
            "Scrape complete"
        );
        Ok(ScrapeReport {
            articles,
            diagnostics: run.diagnostics,
        })
    }

    /// Validate the request and build the listing requests to issue.
    async fn plan(&self, request: &ScrapeRequest, run: &mut Run) -> Result<Plan, ScrapeError> {
        let source = self.source;
        if !source.validate_category(&request.category) {
            return Err(ScrapeError::InvalidCategory {
                source_name: source.name(),
                category: request.category.clone(),
                allowed: source.allowed_categories().to_vec(),
            });
        }

        let first = source.first_page();
        let start = request.start_page.unwrap_or(first);
        let invalid_range = |end| ScrapeError::InvalidPageRange { start, end, first };
        if start < first {
            return Err(invalid_range(request.end_page));
        }

        let (end, probe) = match request.end_page {
            Some(end) => (end, None),
            None if source.supports_bound_discovery() => {
                run.advance(Stage::Probing);
                let (bound, probe) = self.discover_bound(&request.category).await?;
                (bound, Some(probe))
            }
            None if source.defaults_to_single_page() => {
                debug!(start, "No end page given; fetching the start page only");
                (start, None)
            }
            None => {
                return Err(ScrapeError::PageBoundUnavailable {
                    source_name: source.name(),
                    reason: "source has no page count; an end page is required".into(),
                });
            }
        };
        if end < start {
            return Err(invalid_range(Some(end)));
        }
        if end - start >= MAX_PAGES_PER_RUN {
            warn!(start, end, max = MAX_PAGES_PER_RUN, "Page range too large");
            return Err(invalid_range(Some(end)));
        }

        info!(start, end, "Planned listing pages");
        let requests = (start..=end)
            .map(|page| source.page_request(page, &request.category))
            .collect();
        Ok(Plan {
            requests,
            probed: probe.filter(|_| start == first),
        })
    }

    /// Probe the first listing page and read the total page count from it.
    ///
    /// Returns the bound together with the probe response.
    #[instrument(level = "info", skip_all)]
    async fn discover_bound(&self, category: &str) -> Result<(u32, FetchResult), ScrapeError> {
        let source = self.source;
        let probe = [source.page_request(source.first_page(), category)];
        let mut results = fetch_batch(self.http, &probe, NonZeroUsize::MIN).await;
        let (status_code, body) = match results.pop() {
            Some(FetchResult::Success { status_code, body }) => (status_code, body),
            _ => {
                return Err(ScrapeError::TotalFetchFailure {
                    stage: Stage::Probing,
                    attempted: 1,
                });
            }
        };

        match source.extract_bound(&body) {
            Some(bound) => {
                info!(bound, "Discovered page count");
                Ok((bound, FetchResult::Success { status_code, body }))
            }
            None => {
                debug!(body = %truncate_for_log(&body, 300), "Probe body without page count");
                Err(ScrapeError::PageBoundUnavailable {
                    source_name: source.name(),
                    reason: "no last-page indicator in probe response".into(),
                })
            }
        }
    }

    /// Cards per successfully fetched page, keyed by the page URL.
    fn extract_pages(
        &self,
        requests: &[FetchRequest],
        results: Vec<FetchResult>,
        run: &mut Run,
    ) -> Vec<(String, Vec<Card>)> {
        let strategy = self.source.selector_strategy();
        let mut pages = Vec::new();

        for (request, result) in requests.iter().zip(results) {
            match result {
                FetchResult::Success { body, .. } => {
                    let cards = extract(&body, strategy);
                    if cards.is_empty() {
                        warn!(url = %request.url, "No cards found on page");
                        debug!(body = %truncate_for_log(&body, 300), "Empty page body");
                        run.diagnostics.push(Diagnostic::ExtractionGap {
                            url: request.url.clone(),
                        });
                        continue;
                    }
                    debug!(url = %request.url, cards = cards.len(), "Extracted cards");
                    pages.push((request.url.clone(), cards));
                }
                FetchResult::Failure { reason } => {
                    run.diagnostics.push(Diagnostic::FetchFailed {
                        url: request.url.clone(),
                        reason,
                    });
                }
            }
        }
        pages
    }

    fn normalize_pages(
        &self,
        category: &str,
        pages: Vec<(String, Vec<Card>)>,
        run: &mut Run,
    ) -> Vec<Article> {
        let normalizer = Normalizer::new(self.source.base_url().cloned());
        let tag = self.source.article_tag(category);
        let mut articles = Vec::new();

        for (page_url, cards) in pages {
            for card in &cards {
                match normalizer.try_normalize(card, &tag) {
                    Ok(article) => articles.push(article),
                    Err(field) => {
                        warn!(%page_url, %field, "Dropping card without required field");
                        run.diagnostics.push(Diagnostic::MissingRequiredField {
                            page_url: page_url.clone(),
                            field,
                        });
                    }
                }
            }
        }

        // First occurrence wins; every later card for the same URL is reported.
        let mut seen = HashSet::new();
        let collected = articles.len();
        articles.retain(|article| {
            if seen.insert(article.url().to_string()) {
                return true;
            }
            run.diagnostics.push(Diagnostic::DuplicateArticle {
                url: article.url().to_string(),
            });
            false
        });
        if articles.len() < collected {
            info!(
                dropped = collected - articles.len(),
                "Collapsed duplicate article URLs"
            );
        }
        articles
    }
}

/// Listing requests for a run, with the probe response when it already
/// covers `requests[0]`.
struct Plan {
    requests: Vec<FetchRequest>,
    probed: Option<FetchResult>,
}

/// Mutable bookkeeping for one run.
#[derive(Debug, Default)]
struct Run {
    stage: Option<Stage>,
    diagnostics: Vec<Diagnostic>,
}

impl Run {
    fn advance(&mut self, next: Stage) {
        debug_assert!(
            self.stage.is_none_or(|current| current < next),
            "stage {next} cannot follow {:?}",
            self.stage
        );
        info!(stage = %next, "Entering stage");
        self.stage = Some(next);
    }
}

/// Run one scrape of `source` over `http`.
pub async fn scrape<G, S>(
    http: &G,
    source: &S,
    request: &ScrapeRequest,
) -> Result<ScrapeReport, ScrapeError>
where
    G: HttpGet,
    S: SourceAdapter + ?Sized,
{
    Pipeline::new(http, source).scrape(request).await
}
