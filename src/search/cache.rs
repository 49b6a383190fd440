//! Search result cache and history log on top of `Storage`
//!
//! Entries are keyed by the normalised query plus domain filter and expire
//! after a fixed TTL. Expired rows are swept lazily by `evict_expired`.
//! Every call takes `now` explicitly so expiry is testable without sleeping.

use crate::search::engine::SearchResult;
use crate::storage::{CacheRow, SearchHistoryEntry, Storage, StorageError, StorageResult};
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

/// Domain filter label used when no filter is applied
pub const ALL_DOMAINS: &str = "all";

/// Computes the cache key for a query and domain filter
///
/// The query is trimmed and lowercased; a missing filter and `all` share a key.
pub fn cache_key(query: &str, domain_filter: Option<&str>) -> String {
    let domain = domain_filter
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(ALL_DOMAINS)
        .to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(query.trim().to_lowercase().as_bytes());
    hasher.update(b"|");
    hasher.update(domain.as_bytes());
    hex::encode(hasher.finalize())
}

/// TTL cache policy
#[derive(Debug, Clone)]
pub struct QueryCache {
    ttl: Duration,
    enabled: bool,
}

impl QueryCache {
    pub fn new(ttl: std::time::Duration, enabled: bool) -> Self {
        let ttl = Duration::from_std(ttl).unwrap_or_else(|_| Duration::seconds(3600));
        Self { ttl, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the cached results for an unexpired entry
    ///
    /// Rows that cannot be decoded are reported as misses.
    pub fn lookup<S: Storage>(
        &self,
        storage: &S,
        query: &str,
        domain_filter: Option<&str>,
        now: DateTime<Utc>,
    ) -> StorageResult<Option<Vec<SearchResult>>> {
        if !self.enabled {
            return Ok(None);
        }

        let key = cache_key(query, domain_filter);
        let row = match storage.get_cached(&key, now)? {
            Some(row) => row,
            None => return Ok(None),
        };

        match serde_json::from_str(&row.results) {
            Ok(results) => {
                tracing::debug!("Cache hit for {:?}", query);
                Ok(Some(results))
            }
            Err(e) => {
                tracing::warn!("Discarding undecodable cache entry for {:?}: {}", query, e);
                Ok(None)
            }
        }
    }

    /// Stores `results` with expiry `now + ttl`
    ///
    /// Empty result sets are never cached. Returns true if a row was written.
    pub fn store<S: Storage>(
        &self,
        storage: &mut S,
        query: &str,
        domain_filter: Option<&str>,
        results: &[SearchResult],
        now: DateTime<Utc>,
    ) -> StorageResult<bool> {
        if !self.enabled || results.is_empty() {
            return Ok(false);
        }

        let row = CacheRow {
            query_hash: cache_key(query, domain_filter),
            query: query.to_string(),
            domain_filter: domain_filter.map(str::to_string),
            results: serde_json::to_string(results)?,
            created_at: now,
            expires_at: now.checked_add_signed(self.ttl).ok_or_else(|| {
                StorageError::ExpiryOverflow(format!("{} + {}s", now, self.ttl.num_seconds()))
            })?,
        };
        storage.put_cached(&row)?;
        Ok(true)
    }

    /// Removes every entry expired at `now`
    pub fn evict_expired<S: Storage>(&self, storage: &mut S, now: DateTime<Utc>) -> StorageResult<u64> {
        let removed = storage.delete_expired_cache(now)?;
        if removed > 0 {
            tracing::debug!("Evicted {} expired cache entries", removed);
        }
        Ok(removed)
    }

    /// Removes every entry; returns the number removed
    pub fn clear<S: Storage>(&self, storage: &mut S) -> StorageResult<u64> {
        let removed = storage.clear_cache()?;
        tracing::info!("Cleared {} cache entries", removed);
        Ok(removed)
    }

    /// Appends a history row; called for every search
    pub fn record_history<S: Storage>(
        &self,
        storage: &mut S,
        entry: &SearchHistoryEntry,
    ) -> StorageResult<()> {
        storage.append_history(entry)
    }
}
