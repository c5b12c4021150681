//! Crawl state
//!
//! - `Site`: the frontier, the single owner of all crawl state
//! - `PageStatus`: per-URL bookkeeping (queued or crawled)
//! - `SitePage`: the finalized record of one final URL
//! - `Source`: a reference from one page to another

mod page_state;
mod site;

pub use page_state::{PageStatus, SitePage, Source};
pub use site::Site;
