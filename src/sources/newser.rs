//! Newser grid scraper.
//!
//! Newser renders its story grid through `controlpage.aspx`, which returns
//! an HTML fragment of `numgridrows` rows starting at `gridrownum`. Each row
//! holds three stories, so a "page" here is one window of rows. The grid
//! has no page count, so runs must name an end page.
//!
//! Grid tiles carry the headline in the thumbnail's `alt` text and a
//! relative link; the summary sits in `#divDeck` on the story page.

use super::SourceAdapter;
use crate::error::ScrapeError;
use crate::extractor::{DescriptionSelector, HtmlField, HtmlStrategy, SelectorStrategy};
use crate::models::FetchRequest;
use crate::models::fields::{HEADLINE, URL};
use tracing::warn;
use url::Url;

const CONTROL_URL: &str = "https://www.newser.com/controlpage.aspx";
const ARTICLES_PER_ROW: u32 = 3;
const SECTION_ID: u32 = 117;
const CATEGORY_ID: u32 = 19;

#[derive(Debug, Clone)]
pub struct Newser {
    rows_per_request: u32,
    base_url: Url,
    cards: SelectorStrategy,
    description: DescriptionSelector,
}

impl Newser {
    /// `articles_per_request` is rounded up to a whole number of grid rows.
    pub fn new(articles_per_request: u32) -> Result<Self, ScrapeError> {
        let rows_per_request = articles_per_request.div_ceil(ARTICLES_PER_ROW).max(1);
        let fetched = rows_per_request * ARTICLES_PER_ROW;
        if fetched != articles_per_request {
            warn!(
                requested = articles_per_request,
                fetched, "Newser returns articles in rows of three; rounding up"
            );
        }

        Ok(Self {
            rows_per_request,
            base_url: Url::parse("https://www.newser.com")?,
            cards: SelectorStrategy::Html(HtmlStrategy::new(
                "a.aGridSquareLink",
                vec![
                    HtmlField::attr(HEADLINE, Some("img"), "alt")?,
                    HtmlField::attr(URL, None, "href")?,
                ],
            )?),
            description: DescriptionSelector::text("div#divDeck")?,
        })
    }
}

impl SourceAdapter for Newser {
    fn name(&self) -> &'static str {
        "newser"
    }

    fn allowed_categories(&self) -> &'static [&'static str] {
        &["bad"]
    }

    fn page_request(&self, page: u32, _category: &str) -> FetchRequest {
        // u32 * u32 always fits in u64.
        let start_row = u64::from(page.saturating_sub(1)) * u64::from(self.rows_per_request);
        FetchRequest::new(CONTROL_URL)
            .with_param("control", "storysquarecontainer")
            .with_param("sectionid", SECTION_ID)
            .with_param("gridrownum", start_row)
            .with_param("numgridrows", self.rows_per_request)
            .with_param("categoryid", CATEGORY_ID)
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::extract;
    use crate::normalizer::Normalizer;

    fn param<'a>(request: &'a FetchRequest, name: &str) -> Option<&'a str> {
        request
            .query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_rows_round_up_to_multiple_of_three() {
        for (articles, rows) in [(30, "10"), (31, "11"), (1, "1"), (0, "1")] {
            let request = Newser::new(articles).unwrap().page_request(1, "bad");
            assert_eq!(param(&request, "numgridrows"), Some(rows), "{articles} articles");
        }
    }

    #[test]
    fn test_large_windows_do_not_overflow() {
        let newser = Newser::new(30_000_000).unwrap();
        let request = newser.page_request(500, "bad");
        assert_eq!(param(&request, "gridrownum"), Some("4990000000"));

        let request = Newser::new(u32::MAX).unwrap().page_request(u32::MAX, "bad");
        let expected = u64::from(u32::MAX - 1) * u64::from(u32::MAX / 3);
        assert_eq!(param(&request, "gridrownum"), Some(expected.to_string().as_str()));
    }

    #[test]
    fn test_page_request_windows() {
        let newser = Newser::new(9).unwrap();
        let first = newser.page_request(1, "bad");
        let third = newser.page_request(3, "bad");

        assert_eq!(first.url, CONTROL_URL);
        assert!(first.query.contains(&("gridrownum".to_string(), "0".to_string())));
        assert!(first.query.contains(&("numgridrows".to_string(), "3".to_string())));
        assert!(third.query.contains(&("gridrownum".to_string(), "6".to_string())));
        assert!(third.query.contains(&("categoryid".to_string(), "19".to_string())));
        assert!(!newser.supports_bound_discovery());
        assert!(!newser.defaults_to_single_page());
    }

    #[test]
    fn test_grid_tiles_normalize_with_absolute_urls() {
        let newser = Newser::new(3).unwrap();
        let body = r#"
            <a class="aGridSquareLink" href="/story/1001/bridge-collapse.html"><img alt="Bridge collapses" src="a.jpg"></a>
            <a class="aGridSquareLink" href="/story/1002/no-image.html">No image tile</a>
            <a class="aGridSquareLink" href="/story/1003/wildfire.html"><img alt="Wildfire spreads" src="b.jpg"></a>"#;

        let cards = extract(body, newser.selector_strategy());
        assert_eq!(cards.len(), 2);

        let normalizer = Normalizer::new(newser.base_url().cloned());
        let tag = newser.article_tag("bad");
        let articles: Vec<_> = cards.iter().filter_map(|c| normalizer.normalize(c, &tag)).collect();
        assert_eq!(articles[0].url(), "https://www.newser.com/story/1001/bridge-collapse.html");
        assert_eq!(articles[1].headline(), "Wildfire spreads");
        assert!(articles.iter().all(|a| a.category() == "bad"));
    }
}
