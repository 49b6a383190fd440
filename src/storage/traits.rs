//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::crawler::CrawlRecord;
use crate::storage::{CacheRow, PageRecord, RouteStep, SearchHistoryEntry};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Cache expiry out of range: {0}")]
    ExpiryOverflow(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines every database operation the crawler and the search
/// engine need. Each method is one logical transaction.
pub trait Storage {
    // ===== Pages =====

    /// Stores a batch of crawl records atomically
    ///
    /// Each record is inserted or, if its URL already exists, updated in
    /// place (the page id is kept). When the record's parent is already
    /// stored, a parent -> child edge is recorded. Either the whole batch is
    /// committed or none of it is.
    ///
    /// # Arguments
    ///
    /// * `records` - Records in traversal order (parents before children)
    ///
    /// # Returns
    ///
    /// The page ids, in the same order as `records`
    fn store_pages(&mut self, records: &[CrawlRecord]) -> StorageResult<Vec<i64>>;

    /// Gets a page by ID
    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord>;

    /// Gets a page by URL
    fn get_page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>>;

    /// Gets every stored page in id order
    fn all_pages(&self) -> StorageResult<Vec<PageRecord>>;

    /// Reconstructs the parent chain of a page, root first, target last
    ///
    /// The walk stops at a page without a stored parent, or when a page id
    /// repeats (corrupt parent chain).
    fn get_route(&self, page_id: i64) -> StorageResult<Vec<RouteStep>>;

    // ===== Statistics =====

    /// Gets the sorted list of distinct page domains
    fn list_domains(&self) -> StorageResult<Vec<String>>;

    /// Gets total page count
    fn count_total_pages(&self) -> StorageResult<u64>;

    /// Counts the stored parent -> child edges
    fn count_links(&self) -> StorageResult<u64>;

    /// Gets page counts per domain, sorted by domain
    fn pages_per_domain(&self) -> StorageResult<Vec<(String, u64)>>;

    /// Gets the most recent crawl timestamp
    fn last_crawl_time(&self) -> StorageResult<Option<DateTime<Utc>>>;

    /// Estimates the database size in bytes
    fn storage_size_bytes(&self) -> StorageResult<u64>;

    // ===== Search Cache =====

    /// Gets an unexpired cache row by key
    fn get_cached(&self, query_hash: &str, now: DateTime<Utc>) -> StorageResult<Option<CacheRow>>;

    /// Inserts or replaces a cache row
    fn put_cached(&mut self, row: &CacheRow) -> StorageResult<()>;

    /// Deletes rows whose expiry is at or before `now`; returns the number removed
    fn delete_expired_cache(&mut self, now: DateTime<Utc>) -> StorageResult<u64>;

    /// Deletes every cache row; returns the number removed
    fn clear_cache(&mut self) -> StorageResult<u64>;

    /// Counts unexpired cache rows
    fn count_live_cache(&self, now: DateTime<Utc>) -> StorageResult<u64>;

    // ===== Search History =====

    /// Appends one history entry
    fn append_history(&mut self, entry: &SearchHistoryEntry) -> StorageResult<()>;

    /// Gets the most recent history entries, newest first
    fn recent_history(&self, limit: usize) -> StorageResult<Vec<SearchHistoryEntry>>;

    /// Counts all history entries
    fn count_history(&self) -> StorageResult<u64>;
}
