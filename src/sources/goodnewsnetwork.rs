//! Good News Network listing scraper.
//!
//! Listings live under `https://www.goodnewsnetwork.org/category/news/`,
//! optionally narrowed to a sub-category, and paginate as `page/{n}/`.
//! The pagination bar links the last page, which is how the page count is
//! discovered. Cards carry only a headline and link; descriptions come
//! from each article's `og:description` meta tag.

use super::SourceAdapter;
use crate::error::ScrapeError;
use crate::extractor::{DescriptionSelector, HtmlField, HtmlStrategy, SelectorStrategy, parse_selector};
use crate::models::FetchRequest;
use crate::models::fields::{HEADLINE, URL};
use crate::utils::parse_page_count;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

const LISTING_URL: &str = "https://www.goodnewsnetwork.org/category/news/";
const CATEGORIES: &[&str] = &["all", "usa", "world", "inspiring", "animals", "heroes"];

#[derive(Debug, Clone)]
pub struct GoodNewsNetwork {
    base_url: Url,
    cards: SelectorStrategy,
    last_page: Selector,
    description: DescriptionSelector,
}

impl GoodNewsNetwork {
    pub fn new() -> Result<Self, ScrapeError> {
        Ok(Self {
            base_url: Url::parse("https://www.goodnewsnetwork.org/")?,
            cards: SelectorStrategy::Html(HtmlStrategy::new(
                "div.td_module_3.td_module_wrap.td-animation-stack",
                vec![
                    HtmlField::text(HEADLINE, Some("h3"))?,
                    HtmlField::attr(URL, Some("h3 a"), "href")?,
                ],
            )?),
            last_page: parse_selector("div.page-nav.td-pb-padding-side a.last[title]")?,
            description: DescriptionSelector::attr(r#"meta[property="og:description"]"#, "content")?,
        })
    }
}

impl SourceAdapter for GoodNewsNetwork {
    fn name(&self) -> &'static str {
        "goodnewsnetwork"
    }

    fn allowed_categories(&self) -> &'static [&'static str] {
        CATEGORIES
    }

    fn page_request(&self, page: u32, category: &str) -> FetchRequest {
        let category = category.to_ascii_lowercase();
        let mut url = LISTING_URL.to_string();
        if category != "all" {
            url.push_str(&category);
            url.push('/');
        }
        if page > 1 {
            url.push_str(&format!("page/{page}/"));
        }
        FetchRequest::new(url)
    }

    fn supports_bound_discovery(&self) -> bool {
        true
    }

    fn extract_bound(&self, probe_body: &str) -> Option<u32> {
        let document = Html::parse_document(probe_body);
        let text = document
            .select(&self.last_page)
            .next()?
            .text()
            .collect::<String>();
        let bound = parse_page_count(&text);
        debug!(%text, ?bound, "Read last page indicator");
        bound
    }

    fn selector_strategy(&self) -> &SelectorStrategy {
        &self.cards
    }

    fn description_selector(&self) -> Option<&DescriptionSelector> {
        Some(&self.description)
    }

    fn base_url(&self) -> Option<&Url> {
        Some(&self.base_url)
    }

    fn article_tag(&self, _category: &str) -> String {
        "good".to_string()
    }
}
