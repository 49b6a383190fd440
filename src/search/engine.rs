//! Ranked search over the stored corpus
//!
//! A search sweeps expired cache rows, answers from the cache when it can,
//! and otherwise ranks the current index snapshot. Every search is logged
//! to the history, hit or miss.

use crate::config::SearchConfig;
use crate::search::cache::QueryCache;
use crate::search::index::{Document, SearchIndex};
use crate::storage::{RouteStep, SearchHistoryEntry, Storage, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Default number of results returned
pub const DEFAULT_LIMIT: usize = 10;

/// Parameters of one search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub limit: usize,
    pub domain_filter: Option<String>,
    pub use_cache: bool,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: DEFAULT_LIMIT,
            domain_filter: None,
            use_cache: true,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain_filter = Some(domain.into());
        self
    }

    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }
}

/// One ranked hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    pub content_snippet: String,
    pub similarity_score: f64,
    pub route: Vec<RouteStep>,
    pub last_crawled: DateTime<Utc>,
    pub domain: String,
}

/// Answer to a search
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    /// At most `limit` results
    pub results: Vec<SearchResult>,
    /// Number of matches before truncation
    pub total_found: usize,
    pub execution_time_ms: f64,
    pub cached: bool,
    pub domain_filter: Option<String>,
}

/// Returns the first `length` characters, with `...` appended when cut
pub fn snippet(content: &str, length: usize) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(length).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Term-weight index plus result cache
#[derive(Debug)]
pub struct SearchEngine {
    index: SearchIndex,
    cache: QueryCache,
    max_features: usize,
    snippet_length: usize,
}

impl SearchEngine {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            index: SearchIndex::new(),
            cache: QueryCache::new(config.ttl(), config.cache_enabled),
            max_features: config.max_features,
            snippet_length: config.snippet_length,
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Number of terms in the current vocabulary
    pub fn index_size(&self) -> usize {
        self.index.snapshot().vocabulary_size()
    }

    /// Number of indexed documents
    pub fn document_count(&self) -> usize {
        self.index.snapshot().len()
    }

    /// Rebuilds the index from every stored page
    pub fn rebuild<S: Storage>(&self, storage: &S) -> StorageResult<()> {
        let documents = storage
            .all_pages()?
            .into_iter()
            .map(|page| Document {
                id: page.id,
                url: page.url,
                title: page.title,
                content: page.content,
                domain: page.domain,
            })
            .collect();
        self.index.rebuild(documents, self.max_features);
        Ok(())
    }

    /// Runs a search
    ///
    /// # Arguments
    ///
    /// * `storage` - Corpus store holding pages, cache and history
    /// * `request` - Query, limit, domain filter and cache switch
    ///
    /// # Returns
    ///
    /// * `Ok(SearchResponse)` - Ranked results, possibly from cache
    /// * `Err(StorageError)` - The store could not be read or written
    pub fn search<S: Storage>(
        &self,
        storage: &mut S,
        request: &SearchRequest,
    ) -> StorageResult<SearchResponse> {
        let started = Instant::now();
        let now = Utc::now();
        let query = request.query.as_str();
        let domain_filter = request.domain_filter.as_deref();

        self.cache.evict_expired(storage, now)?;

        if request.use_cache {
            if let Some(results) = self.cache.lookup(storage, query, domain_filter, now)? {
                return self.respond(storage, request, results, started, true);
            }
        }

        let snapshot = self.index.snapshot();
        let scored = snapshot.query(query, domain_filter);

        let mut results = Vec::with_capacity(scored.len());
        for hit in scored {
            let doc = match snapshot.document(hit.position) {
                Some(doc) => doc,
                None => continue,
            };
            let page = storage.get_page(doc.id)?;
            results.push(SearchResult {
                url: doc.url.clone(),
                title: doc.title.clone(),
                content_snippet: snippet(&doc.content, self.snippet_length),
                similarity_score: hit.score,
                route: storage.get_route(doc.id)?,
                last_crawled: page.crawled_at,
                domain: doc.domain.clone(),
            });
        }

        if request.use_cache {
            self.cache
                .store(storage, query, domain_filter, &results, now)?;
        }

        self.respond(storage, request, results, started, false)
    }

    fn respond<S: Storage>(
        &self,
        storage: &mut S,
        request: &SearchRequest,
        mut results: Vec<SearchResult>,
        started: Instant,
        cached: bool,
    ) -> StorageResult<SearchResponse> {
        let total_found = results.len();
        let execution_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        self.cache.record_history(
            storage,
            &SearchHistoryEntry {
                query: request.query.clone(),
                domain_filter: request.domain_filter.clone(),
                results_count: total_found,
                execution_time_ms,
                cache_hit: cached,
                searched_at: Utc::now(),
            },
        )?;

        tracing::info!(
            "Search {:?}: {} results in {:.2}ms{}",
            request.query,
            total_found,
            execution_time_ms,
            if cached { " (cached)" } else { "" }
        );

        results.truncate(request.limit);
        Ok(SearchResponse {
            results,
            total_found,
            execution_time_ms,
            cached,
            domain_filter: request.domain_filter.clone(),
        })
    }
}
