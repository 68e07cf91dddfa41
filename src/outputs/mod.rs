//! Output generation for scraped articles.
//!
//! # Submodules
//!
//! - [`json`]: Writes article lists to per-source JSON files

pub mod json;
