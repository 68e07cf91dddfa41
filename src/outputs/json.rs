//! JSON output for downstream consumers.
//!
//! # Output Structure
//!
//! Files are organized by source with one file per date and category:
//! ```text
//! output_dir/
//! └── huffpost/
//!     ├── 2025-05-06_good.json
//!     └── 2025-05-06_bad.json
//! ```
//!
//! A second run on the same day for the same category replaces the file.

use crate::error::ScrapeError;
use crate::models::Article;
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Where the articles for `source`/`category` on `date` are written.
pub fn output_path(output_dir: &str, source: &str, category: &str, date: NaiveDate) -> PathBuf {
    Path::new(output_dir)
        .join(source)
        .join(format!("{}_{}.json", date, category.to_ascii_lowercase()))
}

/// Write `articles` as a pretty-printed JSON array, dated today.
///
/// Returns the path written.
#[instrument(level = "info", skip_all, fields(%output_dir, %source, %category, count = articles.len()))]
pub async fn write_articles(
    articles: &[Article],
    output_dir: &str,
    source: &str,
    category: &str,
) -> Result<PathBuf, ScrapeError> {
    let path = output_path(output_dir, source, category, Local::now().date_naive());
    write_to(articles, &path).await?;
    Ok(path)
}

async fn write_to(articles: &[Article], path: &Path) -> Result<(), ScrapeError> {
    let json = serde_json::to_string_pretty(articles)?;

    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!(path = %path.display(), "Wrote articles JSON");
    Ok(())
}
