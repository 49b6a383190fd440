//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::CrawlRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{CacheRow, PageRecord, RouteStep, SearchHistoryEntry};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::Path;

const PAGE_COLUMNS: &str =
    "id, url, title, content, links, status_code, crawled_at, depth, parent_url, domain";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn page_id_by_url(conn: &Connection, url: &str) -> rusqlite::Result<Option<i64>> {
        conn.query_row("SELECT id FROM pages WHERE url = ?1", params![url], |row| {
            row.get(0)
        })
        .optional()
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn millis_to_timestamp(idx: usize, millis: i64) -> rusqlite::Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, millis))
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    let links_json: String = row.get(4)?;
    let links: Vec<String> = serde_json::from_str(&links_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    let crawled_at: String = row.get(6)?;

    Ok(PageRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        links,
        status_code: row.get(5)?,
        crawled_at: parse_timestamp(6, &crawled_at)?,
        depth: row.get(7)?,
        parent_url: row.get(8)?,
        domain: row.get(9)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Pages =====

    fn store_pages(&mut self, records: &[CrawlRecord]) -> StorageResult<Vec<i64>> {
        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(records.len());
        let mut edges = 0usize;

        for record in records {
            let links = serde_json::to_string(&record.links)?;
            tx.execute(
                "INSERT INTO pages (url, title, content, links, status_code, crawled_at, depth, parent_url, domain)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(url) DO UPDATE SET
                    title = excluded.title,
                    content = excluded.content,
                    links = excluded.links,
                    status_code = excluded.status_code,
                    crawled_at = excluded.crawled_at,
                    depth = excluded.depth,
                    parent_url = excluded.parent_url,
                    domain = excluded.domain",
                params![
                    record.url,
                    record.title,
                    record.content,
                    links,
                    record.status_code,
                    format_timestamp(&record.crawled_at),
                    record.depth,
                    record.parent_url,
                    record.domain,
                ],
            )?;

            let page_id = Self::page_id_by_url(&tx, &record.url)?
                .ok_or_else(|| StorageError::PageNotFound(record.url.clone()))?;

            if let Some(parent_url) = &record.parent_url {
                if let Some(parent_id) = Self::page_id_by_url(&tx, parent_url)? {
                    edges += tx.execute(
                        "INSERT OR IGNORE INTO page_links (from_page_id, to_page_id) VALUES (?1, ?2)",
                        params![parent_id, page_id],
                    )?;
                }
            }

            ids.push(page_id);
        }

        tx.commit()?;
        tracing::debug!("Stored {} pages ({} new edges)", ids.len(), edges);
        Ok(ids)
    }

    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord> {
        let page = self
            .conn
            .query_row(
                &format!("SELECT {} FROM pages WHERE id = ?1", PAGE_COLUMNS),
                params![page_id],
                page_from_row,
            )
            .optional()?;

        page.ok_or_else(|| StorageError::PageNotFound(format!("Page ID {}", page_id)))
    }

    fn get_page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                &format!("SELECT {} FROM pages WHERE url = ?1", PAGE_COLUMNS),
                params![url],
                page_from_row,
            )
            .optional()?;

        Ok(page)
    }

    fn all_pages(&self) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM pages ORDER BY id", PAGE_COLUMNS))?;

        let pages = stmt
            .query_map([], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }

    fn get_route(&self, page_id: i64) -> StorageResult<Vec<RouteStep>> {
        let mut page = self.get_page(page_id)?;
        let mut seen = HashSet::new();
        let mut route = Vec::new();

        loop {
            if !seen.insert(page.id) {
                tracing::warn!("Cycle in parent chain of page {}", page_id);
                break;
            }

            route.push(RouteStep {
                url: page.url.clone(),
                title: page.title.clone(),
            });

            let parent = match &page.parent_url {
                Some(parent_url) => self.get_page_by_url(parent_url)?,
                None => None,
            };

            match parent {
                Some(parent) => page = parent,
                None => break,
            }
        }

        route.reverse();
        Ok(route)
    }

    // ===== Statistics =====

    fn list_domains(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT domain FROM pages ORDER BY domain")?;

        let domains = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(domains)
    }

    fn count_total_pages(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_links(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM page_links", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn pages_per_domain(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT domain, COUNT(*) FROM pages GROUP BY domain ORDER BY domain",
        )?;

        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    fn last_crawl_time(&self) -> StorageResult<Option<DateTime<Utc>>> {
        let latest: Option<String> =
            self.conn
                .query_row("SELECT MAX(crawled_at) FROM pages", [], |row| row.get(0))?;

        match latest {
            Some(value) => Ok(Some(parse_timestamp(0, &value)?)),
            None => Ok(None),
        }
    }

    fn storage_size_bytes(&self) -> StorageResult<u64> {
        let page_count: i64 = self
            .conn
            .query_row("PRAGMA page_count", [], |row| row.get(0))?;
        let page_size: i64 = self
            .conn
            .query_row("PRAGMA page_size", [], |row| row.get(0))?;
        Ok((page_count * page_size).max(0) as u64)
    }

    // ===== Search Cache =====

    fn get_cached(&self, query_hash: &str, now: DateTime<Utc>) -> StorageResult<Option<CacheRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT query_hash, query, domain_filter, results, created_at, expires_at
                 FROM search_cache WHERE query_hash = ?1 AND expires_at > ?2",
                params![query_hash, now.timestamp_millis()],
                |row| {
                    Ok(CacheRow {
                        query_hash: row.get(0)?,
                        query: row.get(1)?,
                        domain_filter: row.get(2)?,
                        results: row.get(3)?,
                        created_at: millis_to_timestamp(4, row.get(4)?)?,
                        expires_at: millis_to_timestamp(5, row.get(5)?)?,
                    })
                },
            )
            .optional()?;

        Ok(row)
    }

    fn put_cached(&mut self, row: &CacheRow) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO search_cache (query_hash, query, domain_filter, results, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(query_hash) DO UPDATE SET
                query = excluded.query,
                domain_filter = excluded.domain_filter,
                results = excluded.results,
                created_at = excluded.created_at,
                expires_at = excluded.expires_at",
            params![
                row.query_hash,
                row.query,
                row.domain_filter,
                row.results,
                row.created_at.timestamp_millis(),
                row.expires_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    fn delete_expired_cache(&mut self, now: DateTime<Utc>) -> StorageResult<u64> {
        let removed = self.conn.execute(
            "DELETE FROM search_cache WHERE expires_at <= ?1",
            params![now.timestamp_millis()],
        )?;
        Ok(removed as u64)
    }

    fn clear_cache(&mut self) -> StorageResult<u64> {
        let removed = self.conn.execute("DELETE FROM search_cache", [])?;
        Ok(removed as u64)
    }

    fn count_live_cache(&self, now: DateTime<Utc>) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM search_cache WHERE expires_at > ?1",
            params![now.timestamp_millis()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Search History =====

    fn append_history(&mut self, entry: &SearchHistoryEntry) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO search_history (query, domain_filter, results_count, execution_time_ms, cache_hit, searched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.query,
                entry.domain_filter,
                entry.results_count as i64,
                entry.execution_time_ms,
                entry.cache_hit,
                format_timestamp(&entry.searched_at),
            ],
        )?;
        Ok(())
    }

    fn recent_history(&self, limit: usize) -> StorageResult<Vec<SearchHistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT query, domain_filter, results_count, execution_time_ms, cache_hit, searched_at
             FROM search_history ORDER BY id DESC LIMIT ?1",
        )?;

        let entries = stmt
            .query_map(params![limit as i64], |row| {
                let searched_at: String = row.get(5)?;
                Ok(SearchHistoryEntry {
                    query: row.get(0)?,
                    domain_filter: row.get(1)?,
                    results_count: row.get::<_, i64>(2)?.max(0) as usize,
                    execution_time_ms: row.get(3)?,
                    cache_hit: row.get(4)?,
                    searched_at: parse_timestamp(5, &searched_at)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn count_history(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM search_history", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
