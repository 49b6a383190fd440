//! Crawler module for web page fetching and traversal
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with content-type filtering and error classification
//! - HTML parsing: title, visible text and link extraction
//! - BFS/DFS traversal with page, depth and politeness limits
//! - Crawl sessions and the single-slot session manager

mod fetcher;
mod parser;
mod record;
mod session;
mod traversal;

pub use fetcher::{
    build_http_client, content_type_accepted, FetchFailure, FetchedPage, HttpFetcher,
    PageFetcher,
};
pub use parser::{collapse_whitespace, parse_html, ParsedPage};
pub use record::{CrawlRecord, NO_TITLE};
pub use session::{CrawlManager, CrawlSession, CrawlStatus};
pub use traversal::{CrawlLimits, TraversalEngine};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order in which the discovered link graph is explored
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum TraversalOrder {
    /// Level by level from the seeds
    #[default]
    #[serde(rename = "bfs", alias = "BFS")]
    #[value(name = "bfs")]
    BreadthFirst,

    /// Follow each link chain to exhaustion before the next sibling
    #[serde(rename = "dfs", alias = "DFS")]
    #[value(name = "dfs")]
    DepthFirst,
}

impl fmt::Display for TraversalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BreadthFirst => f.write_str("BFS"),
            Self::DepthFirst => f.write_str("DFS"),
        }
    }
}
