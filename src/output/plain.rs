//! Plain-text crawl report
//!
//! The report starts with a short header, lists every page with its status
//! and then repeats each error page with the pages that referenced it.

use crate::config::{OutputConfig, When};
use crate::state::{Site, SitePage};
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{self, BufWriter, Write};

/// Maximum snippet length shown under an error page
const MAX_SNIPPET_LEN: usize = 120;

/// Formats the report for a finished site
pub fn format_plain_report(site: &Site, finished_at: DateTime<Local>) -> String {
    let mut report = String::new();
    let errors = site.error_pages();

    report.push_str("linkcrawl report\n");
    report.push_str(&format!("Finished: {}\n", finished_at.format("%Y-%m-%d %H:%M:%S")));
    for url in site.start_urls() {
        report.push_str(&format!("Start URL: {}\n", url));
    }
    report.push_str(&format!(
        "Pages: {}, errors: {}, status: {}\n",
        site.pages().len(),
        errors.len(),
        if site.is_ok() { "ok" } else { "error" }
    ));

    report.push('\n');
    for page in site.sorted_pages() {
        report.push_str(&format!("{}\n", page));
    }

    if !errors.is_empty() {
        report.push_str("\nErrors:\n");
        for page in errors {
            push_error_page(&mut report, page);
        }
    }

    report
}

fn push_error_page(report: &mut String, page: &SitePage) {
    report.push_str(&format!("\n{}\n", page));
    if page.sources.is_empty() {
        report.push_str("  (start URL)\n");
    }
    for source in &page.sources {
        report.push_str(&format!("  from {}\n", source.origin));
        report.push_str(&format!("    {}\n", shorten(&source.snippet)));
    }
}

/// Collapses whitespace and truncates long markup
fn shorten(snippet: &str) -> String {
    let collapsed = snippet.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_SNIPPET_LEN {
        collapsed
    } else {
        let truncated: String = collapsed.chars().take(MAX_SNIPPET_LEN).collect();
        format!("{}...", truncated)
    }
}

/// Writes the report according to the output configuration
///
/// Returns false when the report was suppressed because the crawl found
/// no error and `when` is `error`.
pub fn write_report(site: &Site, config: &OutputConfig) -> io::Result<bool> {
    if config.when == When::Error && site.is_ok() {
        return Ok(false);
    }

    let report = format_plain_report(site, Local::now());
    match &config.output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            writer.write_all(report.as_bytes())?;
            writer.flush()?;
            tracing::info!("Report written to {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(report.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(true)
}
