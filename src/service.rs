//! Caller-facing facade over crawling, storage and search
//!
//! `SearchService` is cheap to clone; clones share the same store, index
//! and crawl slot. Every operation returns a structured value or a typed
//! `RippleError`, ready for a transport layer to map.

use crate::config::Config;
use crate::crawler::{
    CrawlLimits, CrawlManager, CrawlRecord, CrawlSession, CrawlStatus, HttpFetcher,
    TraversalEngine, TraversalOrder,
};
use crate::output::{load_statistics, EngineStats};
use crate::search::{SearchEngine, SearchRequest, SearchResponse};
use crate::state::CrawlPhase;
use crate::storage::{open_storage, SearchHistoryEntry, SqliteStorage, Storage};
use crate::url::UrlPolicy;
use crate::{Result, RippleError};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::task::JoinHandle;

/// Summary of one finished crawl
#[derive(Debug, Clone, Serialize)]
pub struct CrawlOutcome {
    pub phase: CrawlPhase,
    pub algorithm: TraversalOrder,
    pub pages_crawled: usize,
    pub pages_stored: usize,
    pub duration_ms: f64,
}

/// A crawl running in the background
#[derive(Debug)]
pub struct CrawlHandle {
    pub session: Arc<CrawlSession>,
    pub task: JoinHandle<Result<CrawlOutcome>>,
}

/// Crawl, search and statistics operations over one corpus
#[derive(Clone)]
pub struct SearchService {
    config: Arc<Config>,
    storage: Arc<Mutex<SqliteStorage>>,
    engine: Arc<SearchEngine>,
    crawls: Arc<CrawlManager>,
}

impl SearchService {
    /// Opens the database named in the configuration and builds the index
    pub fn open(config: Config) -> Result<Self> {
        let storage = open_storage(Path::new(&config.storage.database_path))?;
        tracing::info!("Opened database {}", config.storage.database_path);
        Self::with_storage(config, storage)
    }

    /// Builds a service over an in-memory database
    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_storage(config, SqliteStorage::new_in_memory()?)
    }

    fn with_storage(config: Config, storage: SqliteStorage) -> Result<Self> {
        let engine = SearchEngine::new(&config.search);
        engine.rebuild(&storage)?;

        Ok(Self {
            crawls: Arc::new(CrawlManager::new(config.crawler.max_pages)),
            config: Arc::new(config),
            storage: Arc::new(Mutex::new(storage)),
            engine: Arc::new(engine),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn storage(&self) -> MutexGuard<'_, SqliteStorage> {
        self.storage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ===== Crawling =====

    /// Starts a crawl in the background and returns immediately
    ///
    /// The crawl is spawned on the Tokio runtime of the calling context.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlHandle)` - The running session and its task
    /// * `Err(RippleError::CrawlInProgress)` - A crawl is already running
    /// * `Err(RippleError::NoRuntime)` - Called outside a Tokio runtime; no session is started
    pub fn start_crawl(&self) -> Result<CrawlHandle> {
        let runtime = tokio::runtime::Handle::try_current()?;
        let (traversal, session) = self.prepare_crawl()?;
        let service = self.clone();
        let task_session = Arc::clone(&session);
        let task = runtime.spawn(async move { service.run_crawl(traversal, task_session).await });
        Ok(CrawlHandle { session, task })
    }

    /// Runs a crawl to completion
    pub async fn crawl(&self) -> Result<CrawlOutcome> {
        let (traversal, session) = self.prepare_crawl()?;
        self.run_crawl(traversal, session).await
    }

    fn prepare_crawl(&self) -> Result<(TraversalEngine<HttpFetcher>, Arc<CrawlSession>)> {
        let crawler = &self.config.crawler;
        let fetcher = HttpFetcher::from_config(&self.config.user_agent, crawler)?;
        let traversal = TraversalEngine::new(
            fetcher,
            UrlPolicy::from_config(crawler),
            CrawlLimits::from_config(crawler),
            crawler.algorithm,
        );
        let session = self.crawls.begin(crawler.max_pages)?;
        Ok((traversal, session))
    }

    async fn run_crawl(
        &self,
        traversal: TraversalEngine<HttpFetcher>,
        session: Arc<CrawlSession>,
    ) -> Result<CrawlOutcome> {
        let started = Instant::now();
        let records = traversal
            .run(&self.config.crawler.seed_urls, &session)
            .await;
        let pages_crawled = records.len();

        let stored = self.store_records(records);
        let phase = session.finish()?;
        let pages_stored = stored?;

        let outcome = CrawlOutcome {
            phase,
            algorithm: traversal.order(),
            pages_crawled,
            pages_stored,
            duration_ms: started.elapsed().as_secs_f64() * 1000.0,
        };
        tracing::info!(
            "Crawl {}: {} pages stored in {:.0}ms",
            outcome.phase,
            outcome.pages_stored,
            outcome.duration_ms
        );
        Ok(outcome)
    }

    /// Stores crawl records as one batch and rebuilds the index
    ///
    /// On a storage failure nothing is committed and the records come back
    /// inside `RippleError::Persist`, so the caller can retry.
    pub fn store_records(&self, records: Vec<CrawlRecord>) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut storage = self.storage();
        match storage.store_pages(&records) {
            Ok(ids) => {
                self.engine.rebuild(&*storage)?;
                Ok(ids.len())
            }
            Err(source) => {
                tracing::error!("Failed to store {} pages: {}", records.len(), source);
                Err(RippleError::Persist {
                    pending: records,
                    source,
                })
            }
        }
    }

    /// Requests the running crawl to stop; false if none is running
    pub fn stop_crawl(&self) -> bool {
        self.crawls.stop()
    }

    pub fn crawl_status(&self) -> CrawlStatus {
        self.crawls.status()
    }

    // ===== Search =====

    pub fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let mut storage = self.storage();
        Ok(self.engine.search(&mut *storage, request)?)
    }

    pub fn list_domains(&self) -> Result<Vec<String>> {
        Ok(self.storage().list_domains()?)
    }

    /// Most recent searches first; `None` uses the configured default limit
    pub fn search_history(&self, limit: Option<usize>) -> Result<Vec<SearchHistoryEntry>> {
        let limit = limit.unwrap_or(self.config.search.history_limit);
        Ok(self.storage().recent_history(limit)?)
    }

    pub fn stats(&self) -> Result<EngineStats> {
        let storage = self.storage();
        Ok(load_statistics(&*storage, &self.engine, &self.crawls)?)
    }

    /// Removes every cached search; returns the number removed
    pub fn clear_cache(&self) -> Result<u64> {
        let mut storage = self.storage();
        Ok(self.engine.cache().clear(&mut *storage)?)
    }

    /// Removes expired cached searches; returns the number removed
    pub fn evict_expired_cache(&self) -> Result<u64> {
        let mut storage = self.storage();
        Ok(self
            .engine
            .cache()
            .evict_expired(&mut *storage, chrono::Utc::now())?)
    }
}
