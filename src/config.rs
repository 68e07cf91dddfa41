//! Run settings with an optional YAML file behind them.
//!
//! Every field has a default, so a config file only needs the keys it wants
//! to change:
//!
//! ```yaml
//! concurrency: 10
//! enrich_concurrency: 100
//! timeout_secs: 30
//! user_agent: "Mozilla/5.0 ..."
//! ```
//!
//! Command-line flags are applied on top by the binary.

use crate::error::ScrapeError;
use crate::pipeline::DEFAULT_CONCURRENCY;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// Browser-like agent; some listing endpoints refuse library defaults.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Listing requests in flight at once.
    pub concurrency: NonZeroUsize,
    /// Article page requests in flight at once during enrichment.
    pub enrich_concurrency: NonZeroUsize,
    /// Per-request timeout.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            enrich_concurrency: NonZeroUsize::new(100).unwrap_or(DEFAULT_CONCURRENCY),
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HarvestConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ScrapeError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ScrapeError> {
        let yaml = tokio::fs::read_to_string(path.as_ref()).await?;
        let config = Self::from_yaml(&yaml)?;
        info!(?config, "Loaded configuration");
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = HarvestConfig::default();
        assert_eq!(config.concurrency.get(), 10);
        assert_eq!(config.enrich_concurrency.get(), 100);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = HarvestConfig::from_yaml("concurrency: 4\ntimeout_secs: 5\n").unwrap();
        assert_eq!(config.concurrency.get(), 4);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.enrich_concurrency.get(), 100);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let err = HarvestConfig::from_yaml("concurrency: 0\n").unwrap_err();
        assert!(matches!(err, ScrapeError::Config(_)));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "user_agent: news-harvest-test").unwrap();

        let config = HarvestConfig::load(file.path()).await.unwrap();
        assert_eq!(config.user_agent, "news-harvest-test");
        assert_eq!(config.concurrency.get(), 10);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = HarvestConfig::load("/definitely/not/here.yaml").await.unwrap_err();
        assert!(matches!(err, ScrapeError::Io(_)));
    }
}
