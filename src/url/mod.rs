//! URL handling module
//!
//! This module provides URL normalization (the dedup key of the whole crawl)
//! and accepted-host matching.

mod matcher;
mod normalize;

pub use matcher::matches_host;
pub use normalize::{normalize_url, NormalizedUrl, SCHEME_HTTP};
