//! Bounded BFS/DFS traversal over the discovered link graph
//!
//! Both orders share one contract:
//! - a URL is fetched at most once per run (visited set of normalized URLs)
//! - a URL is fetched only while `depth <= max_depth` and fewer than
//!   `max_pages` pages have been fetched successfully
//! - the politeness delay follows every successful fetch that leaves work
//!   pending
//! - cancellation is polled between fetches
//!
//! BFS works from a FIFO queue; DFS from an explicit stack, one seed at a time.

use crate::crawler::fetcher::PageFetcher;
use crate::crawler::record::CrawlRecord;
use crate::crawler::session::CrawlSession;
use crate::crawler::TraversalOrder;
use crate::url::{domain_of, UrlPolicy};
use chrono::Utc;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use url::Url;

/// Page, depth and pacing limits for one crawl
#[derive(Debug, Clone, Copy)]
pub struct CrawlLimits {
    pub max_pages: usize,
    pub max_depth: u32,
    pub delay: Duration,
}

impl CrawlLimits {
    pub fn from_config(config: &crate::config::CrawlerConfig) -> Self {
        Self {
            max_pages: config.max_pages,
            max_depth: config.max_depth,
            delay: config.delay(),
        }
    }
}

/// A unit of pending work
#[derive(Debug, Clone)]
struct Frame {
    url: Url,
    depth: u32,
    parent: Option<String>,
}

/// Why a traversal loop ended early
enum Halt {
    Cancelled,
    PageCap,
}

/// Drives a `PageFetcher` over the link graph in BFS or DFS order
#[derive(Debug)]
pub struct TraversalEngine<F> {
    fetcher: F,
    policy: UrlPolicy,
    limits: CrawlLimits,
    order: TraversalOrder,
}

impl<F: PageFetcher> TraversalEngine<F> {
    pub fn new(fetcher: F, policy: UrlPolicy, limits: CrawlLimits, order: TraversalOrder) -> Self {
        Self {
            fetcher,
            policy,
            limits,
            order,
        }
    }

    pub fn order(&self) -> TraversalOrder {
        self.order
    }

    pub fn limits(&self) -> CrawlLimits {
        self.limits
    }

    /// Crawls from `seeds` and returns the records in traversal order
    ///
    /// Seeds failing the URL policy are skipped. Fetch failures contribute
    /// nothing and never end the run.
    ///
    /// # Arguments
    ///
    /// * `seeds` - Seed URLs, visited at depth 0
    /// * `session` - Session receiving progress and carrying the cancel flag
    pub async fn run(&self, seeds: &[String], session: &CrawlSession) -> Vec<CrawlRecord> {
        let seeds: Vec<Url> = seeds
            .iter()
            .filter_map(|seed| {
                let admitted = self.policy.admit(seed);
                if admitted.is_none() {
                    tracing::warn!("Skipping seed rejected by URL policy: {}", seed);
                }
                admitted
            })
            .collect();

        tracing::info!(
            "Starting {} crawl: {} seeds, max {} pages, max depth {}",
            self.order,
            seeds.len(),
            self.limits.max_pages,
            self.limits.max_depth
        );

        let mut records = Vec::new();
        let halt = match self.order {
            TraversalOrder::BreadthFirst => self.breadth_first(seeds, session, &mut records).await,
            TraversalOrder::DepthFirst => self.depth_first(seeds, session, &mut records).await,
        };

        match halt {
            Some(Halt::Cancelled) => {
                tracing::info!("Crawl stopped after {} pages", records.len())
            }
            Some(Halt::PageCap) => {
                tracing::info!("Crawl reached page limit ({} pages)", records.len())
            }
            None => tracing::info!("Crawl finished: {} pages", records.len()),
        }

        records
    }

    async fn breadth_first(
        &self,
        seeds: Vec<Url>,
        session: &CrawlSession,
        records: &mut Vec<CrawlRecord>,
    ) -> Option<Halt> {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<Frame> = seeds
            .into_iter()
            .map(|url| Frame {
                url,
                depth: 0,
                parent: None,
            })
            .collect();

        while let Some(frame) = queue.pop_front() {
            if let Some(halt) = self.should_halt(session, records.len()) {
                return Some(halt);
            }
            if !self.claim(&frame, &mut visited) {
                continue;
            }

            if let Some(record) = self.visit(&frame, session).await {
                if frame.depth < self.limits.max_depth {
                    for link in &record.links {
                        if visited.contains(link) {
                            continue;
                        }
                        if let Ok(url) = Url::parse(link) {
                            queue.push_back(Frame {
                                url,
                                depth: frame.depth + 1,
                                parent: Some(record.url.clone()),
                            });
                        }
                    }
                }
                records.push(record);
                if !queue.is_empty() {
                    self.politeness_pause(session, records.len()).await;
                }
            }
        }

        None
    }

    async fn depth_first(
        &self,
        seeds: Vec<Url>,
        session: &CrawlSession,
        records: &mut Vec<CrawlRecord>,
    ) -> Option<Halt> {
        let mut visited = HashSet::new();

        let mut seeds = seeds.into_iter().peekable();
        while let Some(seed) = seeds.next() {
            let mut stack = vec![Frame {
                url: seed,
                depth: 0,
                parent: None,
            }];

            while let Some(frame) = stack.pop() {
                if let Some(halt) = self.should_halt(session, records.len()) {
                    return Some(halt);
                }
                if !self.claim(&frame, &mut visited) {
                    continue;
                }

                if let Some(record) = self.visit(&frame, session).await {
                    if frame.depth < self.limits.max_depth {
                        // Reversed so the first extracted link is explored first
                        for link in record.links.iter().rev() {
                            if visited.contains(link) {
                                continue;
                            }
                            if let Ok(url) = Url::parse(link) {
                                stack.push(Frame {
                                    url,
                                    depth: frame.depth + 1,
                                    parent: Some(record.url.clone()),
                                });
                            }
                        }
                    }
                    records.push(record);
                    if !stack.is_empty() || seeds.peek().is_some() {
                        self.politeness_pause(session, records.len()).await;
                    }
                }
            }
        }

        None
    }

    fn should_halt(&self, session: &CrawlSession, fetched: usize) -> Option<Halt> {
        if session.is_cancelled() {
            return Some(Halt::Cancelled);
        }
        if fetched >= self.limits.max_pages {
            return Some(Halt::PageCap);
        }
        None
    }

    /// Marks the frame's URL visited; false if it was already visited or too deep
    fn claim(&self, frame: &Frame, visited: &mut HashSet<String>) -> bool {
        if frame.depth > self.limits.max_depth {
            return false;
        }
        visited.insert(frame.url.to_string())
    }

    async fn visit(&self, frame: &Frame, session: &CrawlSession) -> Option<CrawlRecord> {
        let url = frame.url.as_str();
        session.set_current_url(url);
        tracing::debug!("Fetching {} (depth {})", url, frame.depth);

        match self.fetcher.fetch(&frame.url).await {
            Ok(page) => {
                let count = session.record_page();
                tracing::info!(
                    "[{}/{}] {} ({} links)",
                    count,
                    self.limits.max_pages,
                    url,
                    page.links.len()
                );

                Some(CrawlRecord {
                    url: url.to_string(),
                    title: page.title,
                    content: page.content,
                    links: page.links,
                    status_code: page.status_code,
                    crawled_at: Utc::now(),
                    depth: frame.depth,
                    parent_url: frame.parent.clone(),
                    domain: domain_of(url),
                })
            }
            Err(failure) => {
                tracing::warn!("Failed to fetch {}: {}", url, failure);
                None
            }
        }
    }

    async fn politeness_pause(&self, session: &CrawlSession, fetched: usize) {
        if fetched < self.limits.max_pages {
            session.pause(self.limits.delay).await;
        }
    }
}
