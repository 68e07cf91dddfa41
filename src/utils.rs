//! Small helpers shared by the sources and the binary.
//!
//! - Page-count parsing for "last page" indicators
//! - String truncation for logging response bodies
//! - File system validation for the output directory

use crate::error::ScrapeError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

static PAGE_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,3}(?:[,.\s]\d{3})+|\d+").expect("valid page count regex"));

/// Parse a page count out of indicator text such as `"1,234"` or
/// `"Page 12"`.
///
/// Thousands separators (`,`, `.`, whitespace) are accepted between digit
/// groups. Returns `None` when there are no digits or the value is zero.
///
/// # Examples
///
/// ```
/// use news_harvest::utils::parse_page_count;
///
/// assert_eq!(parse_page_count("1,234"), Some(1234));
/// assert_eq!(parse_page_count("Last »"), None);
/// ```
pub fn parse_page_count(text: &str) -> Option<u32> {
    let digits: String = PAGE_COUNT
        .find(text)?
        .as_str()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse::<u32>().ok().filter(|&n| n > 0)
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary)
/// with an ellipsis and the number of dropped bytes appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), ScrapeError> {
    fs::create_dir_all(path).await?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
