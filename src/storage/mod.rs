//! Storage module for persisting the corpus and search state
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Page persistence with provenance (parent, depth)
//! - Link edges and route reconstruction
//! - Search result cache and search history

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Initializes or opens a storage database
///
/// Parent directories are created when missing.
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    SqliteStorage::new(path)
}

/// Represents a page in the database
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRecord {
    pub id: i64,
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

/// One hop of a route from a crawl root to a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStep {
    pub url: String,
    pub title: String,
}

/// A stored search cache row; `results` is the serialized result list
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRow {
    pub query_hash: String,
    pub query: String,
    pub domain_filter: Option<String>,
    pub results: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// One logged search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHistoryEntry {
    pub query: String,
    pub domain_filter: Option<String>,
    pub results_count: usize,
    pub execution_time_ms: f64,
    pub cache_hit: bool,
    pub searched_at: DateTime<Utc>,
}
