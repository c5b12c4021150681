//! Output module for crawl reports
//!
//! Renders a finished [`Site`](crate::state::Site) as plain text, to stdout
//! or to a file.

mod plain;

pub use plain::{format_plain_report, write_report};
