//! HuffPost topic feed.
//!
//! HuffPost serves its "good news" and "bad news" topics as JSON from
//! `/api/topic/{category}-news/cards`, paged with `page` and `limit`.
//! Every card already carries its description, so no enrichment fetch is
//! needed; sponsored cards come without one and are skipped. The feed has
//! no page count, so a run without an end page reads a single page.

use super::SourceAdapter;
use crate::extractor::{JsonField, JsonStrategy, SelectorStrategy};
use crate::models::FetchRequest;
use crate::models::fields::{DESCRIPTION, HEADLINE, URL};

const CATEGORIES: &[&str] = &["good", "bad"];

#[derive(Debug, Clone)]
pub struct HuffPost {
    page_size: u32,
    cards: SelectorStrategy,
}

impl HuffPost {
    /// `page_size` is the number of cards requested per page (at least 1).
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            cards: SelectorStrategy::Json(JsonStrategy::new(
                "/cards",
                vec![
                    JsonField::new(HEADLINE, "/headlines/0/text"),
                    JsonField::new(URL, "/headlines/0/url"),
                    JsonField::new(DESCRIPTION, "/description"),
                ],
            )),
        }
    }
}

impl SourceAdapter for HuffPost {
    fn name(&self) -> &'static str {
        "huffpost"
    }

    fn allowed_categories(&self) -> &'static [&'static str] {
        CATEGORIES
    }

    fn page_request(&self, page: u32, category: &str) -> FetchRequest {
        FetchRequest::new(format!(
            "https://www.huffpost.com/api/topic/{}-news/cards",
            category.to_ascii_lowercase()
        ))
        .with_param("page", page)
        .with_param("limit", self.page_size)
    }

    fn defaults_to_single_page(&self) -> bool {
        true
    }

    fn selector_strategy(&self) -> &SelectorStrategy {
        &self.cards
    }
}
