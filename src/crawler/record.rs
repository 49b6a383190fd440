use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title used when a page has no usable `<title>`
pub const NO_TITLE: &str = "No Title";

/// One successfully fetched page, as produced by the traversal
///
/// `depth` is 0 for seeds and `parent.depth + 1` otherwise. `domain` is the
/// lowercased host with any `www.` prefix removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlRecord {
    pub url: String,
    pub title: String,
    pub content: String,
    pub links: Vec<String>,
    pub status_code: u16,
    pub crawled_at: DateTime<Utc>,
    pub depth: u32,
    pub parent_url: Option<String>,
    pub domain: String,
}

impl CrawlRecord {
    /// Returns true if this record was a crawl seed
    pub fn is_seed(&self) -> bool {
        self.parent_url.is_none()
    }
}
