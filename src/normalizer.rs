//! Mapping [`Card`]s onto [`Article`]s.

use crate::models::fields::{DESCRIPTION, HEADLINE, URL};
use crate::models::{Article, Card, MissingField};
use url::Url;

/// Pure card → article mapping for one source.
///
/// Relative hrefs are resolved against the source's base URL. Only
/// `http`/`https` links are accepted.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    base_url: Option<Url>,
}

impl Normalizer {
    pub fn new(base_url: Option<Url>) -> Self {
        Self { base_url }
    }

    /// The article for `card`, or `None` when a required field is missing.
    pub fn normalize(&self, card: &Card, category: &str) -> Option<Article> {
        self.try_normalize(card, category).ok()
    }

    /// Like [`normalize`](Self::normalize) but names the missing field.
    pub fn try_normalize(&self, card: &Card, category: &str) -> Result<Article, MissingField> {
        let headline = card.get(HEADLINE).ok_or(MissingField::Headline)?;
        let raw_url = card.get(URL).ok_or(MissingField::Url)?;
        let url = self.resolve(raw_url).ok_or(MissingField::Url)?;
        Article::new(headline, url.as_str(), card.get(DESCRIPTION), category)
    }

    fn resolve(&self, raw: &str) -> Option<Url> {
        let raw = raw.trim();
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => self.base_url.as_ref()?.join(raw).ok()?,
            Err(_) => return None,
        };
        matches!(url.scheme(), "http" | "https").then_some(url)
    }
}
