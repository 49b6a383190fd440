//! Statistics gathered from the corpus store, index and crawl manager
//!
//! This module provides functionality for extracting and displaying
//! engine statistics.

use crate::crawler::{CrawlManager, CrawlStatus};
use crate::search::SearchEngine;
use crate::storage::{Storage, StorageResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Engine statistics summary
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    /// Number of stored pages
    pub total_pages: u64,

    /// Number of logged searches
    pub total_searches: u64,

    /// Number of unexpired cache entries
    pub cached_queries: u64,

    /// Most recent page crawl
    pub last_crawl: Option<DateTime<Utc>>,

    /// Estimated database size
    pub database_size_bytes: u64,

    /// Vocabulary size of the current index
    pub index_size: usize,

    /// Stored parent -> child edges
    pub total_links: u64,

    /// Distinct page domains
    pub domains: Vec<String>,

    /// Pages per domain
    pub domain_stats: BTreeMap<String, u64>,

    pub crawl_status: CrawlStatus,
}

/// Loads statistics
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `engine` - The search engine (index size)
/// * `crawls` - The crawl manager (current status)
///
/// # Returns
///
/// * `Ok(EngineStats)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics<S: Storage>(
    storage: &S,
    engine: &SearchEngine,
    crawls: &CrawlManager,
) -> StorageResult<EngineStats> {
    let now = Utc::now();

    Ok(EngineStats {
        total_pages: storage.count_total_pages()?,
        total_searches: storage.count_history()?,
        cached_queries: storage.count_live_cache(now)?,
        last_crawl: storage.last_crawl_time()?,
        database_size_bytes: storage.storage_size_bytes()?,
        index_size: engine.index_size(),
        total_links: storage.count_links()?,
        domains: storage.list_domains()?,
        domain_stats: storage.pages_per_domain()?.into_iter().collect(),
        crawl_status: crawls.status_at(now),
    })
}

/// Renders statistics as a human-readable report
pub fn format_statistics(stats: &EngineStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Search Engine Statistics ===\n");

    let _ = writeln!(out, "Corpus:");
    let _ = writeln!(out, "  Total pages: {}", stats.total_pages);
    let _ = writeln!(out, "  Total links: {}", stats.total_links);
    let _ = writeln!(out, "  Indexed terms: {}", stats.index_size);
    let _ = writeln!(
        out,
        "  Database size: {:.1} KiB",
        stats.database_size_bytes as f64 / 1024.0
    );
    match stats.last_crawl {
        Some(ts) => {
            let _ = writeln!(out, "  Last crawl: {}", ts.to_rfc3339());
        }
        None => {
            let _ = writeln!(out, "  Last crawl: never");
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Search:");
    let _ = writeln!(out, "  Total searches: {}", stats.total_searches);
    let _ = writeln!(out, "  Cached queries: {}", stats.cached_queries);
    let _ = writeln!(out);

    if !stats.domain_stats.is_empty() {
        let _ = writeln!(out, "Pages by Domain ({}):", stats.domains.len());
        // Sort domains by count (descending)
        let mut counts: Vec<_> = stats.domain_stats.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (domain, count) in counts {
            let percentage = if stats.total_pages > 0 {
                (*count as f64 / stats.total_pages as f64) * 100.0
            } else {
                0.0
            };
            let _ = writeln!(out, "  {}: {} ({:.1}%)", domain, count, percentage);
        }
        let _ = writeln!(out);
    }

    let status = &stats.crawl_status;
    let _ = writeln!(
        out,
        "Crawl: {} ({} / {} pages, {:.1}%)",
        status.status, status.pages_crawled, status.total_pages, status.progress_percentage
    );

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &EngineStats) {
    print!("{}", format_statistics(stats));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::crawler::CrawlRecord;
    use crate::storage::SqliteStorage;

    fn page(url: &str, domain: &str) -> CrawlRecord {
        CrawlRecord {
            url: url.to_string(),
            title: "Title".to_string(),
            content: "Some words here".to_string(),
            links: vec![],
            status_code: 200,
            crawled_at: Utc::now(),
            depth: 0,
            parent_url: None,
            domain: domain.to_string(),
        }
    }

    #[test]
    fn test_load_statistics() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .store_pages(&[
                page("https://a.test/1", "a.test"),
                page("https://a.test/2", "a.test"),
                page("https://b.test/", "b.test"),
            ])
            .unwrap();
        let engine = SearchEngine::new(&SearchConfig::default());
        engine.rebuild(&storage).unwrap();

        let stats = load_statistics(&storage, &engine, &CrawlManager::new(100)).unwrap();

        assert_eq!(stats.total_pages, 3);
        assert_eq!(stats.total_searches, 0);
        assert_eq!(stats.domains, vec!["a.test".to_string(), "b.test".to_string()]);
        assert_eq!(stats.domain_stats["a.test"], 2);
        assert!(stats.index_size > 0);
        assert!(stats.last_crawl.is_some());
    }

    #[test]
    fn test_format_statistics() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let engine = SearchEngine::new(&SearchConfig::default());
        let stats = load_statistics(&storage, &engine, &CrawlManager::new(100)).unwrap();

        let report = format_statistics(&stats);
        assert!(report.contains("Total pages: 0"));
        assert!(report.contains("Last crawl: never"));
        assert!(report.contains("Crawl: idle"));
    }
}
