//! Turning listing bodies into [`Card`]s.
//!
//! A [`SelectorStrategy`] describes where article cards live in a response
//! body and which named fields to read from each one:
//!
//! - [`HtmlStrategy`]: a CSS selector for the card element plus per-field
//!   CSS selectors reading either text or an attribute
//! - [`JsonStrategy`]: a JSON pointer to the card array plus per-field
//!   JSON pointers
//!
//! Extraction never fails. A body that matches nothing yields no cards and a
//! card missing a required field is dropped with a warning, so a changed
//! site layout degrades output instead of stopping the run.

use crate::error::ScrapeError;
use crate::models::Card;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::{debug, warn};

/// Compile a CSS selector, keeping the offending text in the error.
pub fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })
}

/// What part of a matched element holds the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSource {
    /// All descendant text, concatenated and trimmed.
    Text,
    /// The value of the named attribute.
    Attr(String),
}

impl FieldSource {
    fn read(&self, element: ElementRef<'_>) -> Option<String> {
        let value = match self {
            FieldSource::Text => element.text().collect::<String>(),
            FieldSource::Attr(name) => element.value().attr(name)?.to_string(),
        };
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    }
}

/// One named field read from an HTML card.
#[derive(Debug, Clone)]
pub struct HtmlField {
    name: &'static str,
    selector: Option<Selector>,
    source: FieldSource,
    required: bool,
}

impl HtmlField {
    /// Read the text of the first element matching `selector` inside the
    /// card, or of the card itself when `selector` is `None`.
    pub fn text(name: &'static str, selector: Option<&str>) -> Result<Self, ScrapeError> {
        Ok(Self {
            name,
            selector: selector.map(parse_selector).transpose()?,
            source: FieldSource::Text,
            required: true,
        })
    }

    /// Read attribute `attr` of the first element matching `selector`
    /// inside the card, or of the card itself when `selector` is `None`.
    pub fn attr(
        name: &'static str,
        selector: Option<&str>,
        attr: &str,
    ) -> Result<Self, ScrapeError> {
        Ok(Self {
            name,
            selector: selector.map(parse_selector).transpose()?,
            source: FieldSource::Attr(attr.to_string()),
            required: true,
        })
    }

    /// Keep cards that lack this field.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn read(&self, card: ElementRef<'_>) -> Option<String> {
        let target = match &self.selector {
            Some(selector) => card.select(selector).next()?,
            None => card,
        };
        self.source.read(target)
    }
}

#[derive(Debug, Clone)]
pub struct HtmlStrategy {
    card: Selector,
    fields: Vec<HtmlField>,
}

impl HtmlStrategy {
    pub fn new(card: &str, fields: Vec<HtmlField>) -> Result<Self, ScrapeError> {
        Ok(Self {
            card: parse_selector(card)?,
            fields,
        })
    }
}

/// One named field read from a JSON card.
#[derive(Debug, Clone)]
pub struct JsonField {
    name: &'static str,
    pointer: String,
    required: bool,
}

impl JsonField {
    pub fn new(name: &'static str, pointer: &str) -> Self {
        Self {
            name,
            pointer: pointer.to_string(),
            required: true,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn read(&self, card: &Value) -> Option<String> {
        let value = match card.pointer(&self.pointer)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!value.is_empty()).then_some(value)
    }
}

#[derive(Debug, Clone)]
pub struct JsonStrategy {
    cards_pointer: String,
    fields: Vec<JsonField>,
}

impl JsonStrategy {
    pub fn new(cards_pointer: &str, fields: Vec<JsonField>) -> Self {
        Self {
            cards_pointer: cards_pointer.to_string(),
            fields,
        }
    }
}

#[derive(Debug, Clone)]
pub enum SelectorStrategy {
    Html(HtmlStrategy),
    Json(JsonStrategy),
}

/// Pull every card out of `body` according to `strategy`.
pub fn extract(body: &str, strategy: &SelectorStrategy) -> Vec<Card> {
    match strategy {
        SelectorStrategy::Html(html) => extract_html(body, html),
        SelectorStrategy::Json(json) => extract_json(body, json),
    }
}

fn extract_html(body: &str, strategy: &HtmlStrategy) -> Vec<Card> {
    let document = Html::parse_document(body);
    let mut cards = Vec::new();
    let mut dropped = 0usize;

    for (index, element) in document.select(&strategy.card).enumerate() {
        match build_card(&strategy.fields, |f| f.read(element), |f| (f.name, f.required)) {
            Ok(card) => cards.push(card),
            Err(field) => {
                dropped += 1;
                warn!(index, field, "Dropping card missing required field");
            }
        }
    }

    debug!(cards = cards.len(), dropped, "Extracted HTML cards");
    cards
}

fn extract_json(body: &str, strategy: &JsonStrategy) -> Vec<Card> {
    let root: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Response body is not valid JSON");
            return Vec::new();
        }
    };
    let Some(items) = root.pointer(&strategy.cards_pointer).and_then(Value::as_array) else {
        warn!(pointer = %strategy.cards_pointer, "No card array in JSON response");
        return Vec::new();
    };

    let mut cards = Vec::new();
    let mut dropped = 0usize;
    for (index, item) in items.iter().enumerate() {
        match build_card(&strategy.fields, |f| f.read(item), |f| (f.name, f.required)) {
            Ok(card) => cards.push(card),
            Err(field) => {
                dropped += 1;
                warn!(index, field, "Dropping card missing required field");
            }
        }
    }

    debug!(cards = cards.len(), dropped, "Extracted JSON cards");
    cards
}

/// Read each field; `Err` names the first required field that was absent.
fn build_card<F>(
    fields: &[F],
    read: impl Fn(&F) -> Option<String>,
    meta: impl Fn(&F) -> (&'static str, bool),
) -> Result<Card, &'static str> {
    let mut card = Card::new();
    for field in fields {
        let (name, required) = meta(field);
        match read(field) {
            Some(value) => card.insert(name, value),
            None if required => return Err(name),
            None => {}
        }
    }
    Ok(card)
}

/// Locates an article's description on its own page.
#[derive(Debug, Clone)]
pub struct DescriptionSelector {
    selector: Selector,
    source: FieldSource,
}

impl DescriptionSelector {
    pub fn text(selector: &str) -> Result<Self, ScrapeError> {
        Ok(Self {
            selector: parse_selector(selector)?,
            source: FieldSource::Text,
        })
    }

    pub fn attr(selector: &str, attr: &str) -> Result<Self, ScrapeError> {
        Ok(Self {
            selector: parse_selector(selector)?,
            source: FieldSource::Attr(attr.to_string()),
        })
    }

    /// The description in `body`, if the first matching element has one.
    pub fn find(&self, body: &str) -> Option<String> {
        let document = Html::parse_document(body);
        let element = document.select(&self.selector).next()?;
        self.source.read(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fields::{DESCRIPTION, HEADLINE, URL};

    fn listing_strategy() -> SelectorStrategy {
        SelectorStrategy::Html(
            HtmlStrategy::new(
                "div.card",
                vec![
                    HtmlField::text(HEADLINE, Some("h3")).unwrap(),
                    HtmlField::attr(URL, Some("h3 a"), "href").unwrap(),
                    HtmlField::text(DESCRIPTION, Some("p.lede")).unwrap().optional(),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_extract_html_cards() {
        let body = r#"
            <html><body>
              <div class="card"><h3><a href="https://example.com/one">One</a></h3><p class="lede">First</p></div>
              <div class="card"><h3><a href="/two">Two</a></h3></div>
            </body></html>"#;

        let cards = extract(body, &listing_strategy());
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].get(HEADLINE), Some("One"));
        assert_eq!(cards[0].get(URL), Some("https://example.com/one"));
        assert_eq!(cards[0].get(DESCRIPTION), Some("First"));
        assert_eq!(cards[1].get(URL), Some("/two"));
        assert_eq!(cards[1].get(DESCRIPTION), None);
    }

    #[test]
    fn test_card_missing_required_field_is_dropped() {
        let body = r#"
            <div class="card"><h3>No link here</h3></div>
            <div class="card"><h3><a href="/ok">Fine</a></h3></div>"#;

        let cards = extract(body, &listing_strategy());
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].get(HEADLINE), Some("Fine"));
    }

    #[test]
    fn test_no_matching_cards_is_empty() {
        let cards = extract("<html><p>layout changed</p></html>", &listing_strategy());
        assert!(cards.is_empty());
    }

    #[test]
    fn test_card_element_itself_as_field_target() {
        let strategy = SelectorStrategy::Html(
            HtmlStrategy::new(
                "a.tile",
                vec![
                    HtmlField::attr(HEADLINE, Some("img"), "alt").unwrap(),
                    HtmlField::attr(URL, None, "href").unwrap(),
                ],
            )
            .unwrap(),
        );
        let body = r#"<a class="tile" href="/story/1"><img alt="Storm hits coast" src="x.jpg"></a>"#;

        let cards = extract(body, &strategy);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].get(HEADLINE), Some("Storm hits coast"));
        assert_eq!(cards[0].get(URL), Some("/story/1"));
    }

    #[test]
    fn test_extract_json_cards() {
        let strategy = SelectorStrategy::Json(JsonStrategy::new(
            "/cards",
            vec![
                JsonField::new(HEADLINE, "/headlines/0/text"),
                JsonField::new(URL, "/headlines/0/url"),
                JsonField::new(DESCRIPTION, "/description"),
            ],
        ));
        let body = r#"{"cards": [
            {"headlines": [{"text": "Good thing", "url": "https://example.com/g"}], "description": "Nice"},
            {"headlines": [{"text": "Sponsored", "url": "https://example.com/s"}]},
            {"headlines": []}
        ]}"#;

        let cards = extract(body, &strategy);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].get(HEADLINE), Some("Good thing"));
        assert_eq!(cards[0].get(DESCRIPTION), Some("Nice"));
    }

    #[test]
    fn test_malformed_json_is_empty() {
        let strategy = SelectorStrategy::Json(JsonStrategy::new("/cards", vec![]));
        assert!(extract("<html>not json</html>", &strategy).is_empty());
        assert!(extract(r#"{"items": []}"#, &strategy).is_empty());
    }

    #[test]
    fn test_text_split_by_inline_markup_stays_whole() {
        let body = r#"
            <div class="card"><h3><a href="/dogs"><em>Dog</em>s rescue <b>kit</b>tens</a></h3></div>"#;

        let cards = extract(body, &listing_strategy());
        assert_eq!(cards[0].get(HEADLINE), Some("Dogs rescue kittens"));

        let deck = DescriptionSelector::text("div#deck").unwrap();
        assert_eq!(
            deck.find(r#"<div id="deck">Re<i>un</i>ited at last</div>"#).as_deref(),
            Some("Reunited at last")
        );
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        let err = HtmlStrategy::new("div[", vec![]).unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidSelector { .. }));
    }

    #[test]
    fn test_description_selector_meta_attr() {
        let selector = DescriptionSelector::attr(r#"meta[property="og:description"]"#, "content").unwrap();
        let body = r#"<html><head><meta property="og:description" content="A dog learns to surf."></head></html>"#;
        assert_eq!(selector.find(body).as_deref(), Some("A dog learns to surf."));
        assert_eq!(selector.find("<html></html>"), None);
    }

    #[test]
    fn test_description_selector_text() {
        let selector = DescriptionSelector::text("div#divDeck").unwrap();
        let body = r#"<div id="divDeck">  Officials say the bridge will close.  </div>"#;
        assert_eq!(
            selector.find(body).as_deref(),
            Some("Officials say the bridge will close.")
        );
    }
}
