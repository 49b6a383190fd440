//! Crawl sessions and the single-slot session manager
//!
//! A `CrawlSession` is the shared, observable state of one crawl run. The
//! traversal mutates it; status queries read it. `CrawlManager` holds at
//! most one session and refuses to begin a second while one is running.

use crate::state::{CrawlPhase, StatusLabel};
use crate::{Result, RippleError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Observable state of one crawl run
#[derive(Debug)]
pub struct CrawlSession {
    phase: AtomicU8,
    cancelled: AtomicBool,
    wake: Notify,
    pages_crawled: AtomicUsize,
    max_pages: usize,
    current_url: Mutex<Option<String>>,
    started_at: Mutex<Option<DateTime<Utc>>>,
}

impl CrawlSession {
    pub fn new(max_pages: usize) -> Self {
        Self {
            phase: AtomicU8::new(CrawlPhase::Idle.to_u8()),
            cancelled: AtomicBool::new(false),
            wake: Notify::new(),
            pages_crawled: AtomicUsize::new(0),
            max_pages,
            current_url: Mutex::new(None),
            started_at: Mutex::new(None),
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        CrawlPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    pub fn pages_crawled(&self) -> usize {
        self.pages_crawled.load(Ordering::SeqCst)
    }

    pub fn current_url(&self) -> Option<String> {
        lock(&self.current_url).clone()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        *lock(&self.started_at)
    }

    /// Moves the session to `next`
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The transition was applied
    /// * `Err(RippleError::InvalidTransition)` - The lifecycle forbids it
    pub fn transition(&self, next: CrawlPhase) -> Result<()> {
        let current = self.phase();
        if !current.can_transition_to(next) {
            return Err(RippleError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        self.phase
            .compare_exchange(
                current.to_u8(),
                next.to_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .map_err(|actual| RippleError::InvalidTransition {
                from: CrawlPhase::from_u8(actual),
                to: next,
            })?;

        if next == CrawlPhase::Running {
            *lock(&self.started_at) = Some(Utc::now());
        }

        tracing::debug!("Crawl session {} -> {}", current, next);
        Ok(())
    }

    /// Ends a running session: `Stopped` if cancellation was requested, else `Completed`
    pub fn finish(&self) -> Result<CrawlPhase> {
        let next = if self.is_cancelled() {
            CrawlPhase::Stopped
        } else {
            CrawlPhase::Completed
        };
        self.transition(next)?;
        *lock(&self.current_url) = None;
        Ok(next)
    }

    /// Requests cooperative cancellation
    ///
    /// The in-flight fetch is allowed to finish; a pending politeness delay
    /// is cut short.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Sleeps for `delay` unless cancellation arrives first
    pub async fn pause(&self, delay: Duration) {
        if delay.is_zero() || self.is_cancelled() {
            return;
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = self.wake.notified() => {
                tracing::debug!("Politeness delay interrupted");
            }
        }
    }

    pub(crate) fn set_current_url(&self, url: &str) {
        *lock(&self.current_url) = Some(url.to_string());
    }

    pub(crate) fn record_page(&self) -> usize {
        self.pages_crawled.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Builds a status snapshot at `now`
    pub fn status_at(&self, now: DateTime<Utc>) -> CrawlStatus {
        let phase = self.phase();
        let pages_crawled = self.pages_crawled();
        let start_time = self.started_at();

        let estimated_completion = match start_time {
            Some(start) if phase.is_running() && pages_crawled > 0 => {
                estimate_completion(start, now, pages_crawled, self.max_pages)
            }
            _ => None,
        };

        CrawlStatus {
            status: StatusLabel::from(phase),
            pages_crawled,
            total_pages: self.max_pages,
            progress_percentage: progress_percentage(pages_crawled, self.max_pages),
            current_url: self.current_url(),
            start_time,
            estimated_completion,
        }
    }
}

/// Linear extrapolation: `start + elapsed * (max_pages / pages_crawled)`
fn estimate_completion(
    start: DateTime<Utc>,
    now: DateTime<Utc>,
    pages_crawled: usize,
    max_pages: usize,
) -> Option<DateTime<Utc>> {
    if pages_crawled == 0 {
        return None;
    }
    let elapsed_ms = (now - start).num_milliseconds().max(0) as f64;
    let total_ms = elapsed_ms * (max_pages as f64 / pages_crawled as f64);
    start.checked_add_signed(chrono::Duration::milliseconds(total_ms as i64))
}

fn progress_percentage(pages_crawled: usize, max_pages: usize) -> f64 {
    if max_pages == 0 {
        return 0.0;
    }
    (pages_crawled as f64 / max_pages as f64 * 100.0).min(100.0)
}

/// Crawl status as reported to callers
#[derive(Debug, Clone, Serialize)]
pub struct CrawlStatus {
    pub status: StatusLabel,
    pub pages_crawled: usize,
    pub total_pages: usize,
    pub progress_percentage: f64,
    pub current_url: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub estimated_completion: Option<DateTime<Utc>>,
}

/// Owns the single crawl session slot
#[derive(Debug)]
pub struct CrawlManager {
    slot: Mutex<Option<Arc<CrawlSession>>>,
    default_max_pages: usize,
}

impl CrawlManager {
    /// Creates a manager; `default_max_pages` is reported while idle
    pub fn new(default_max_pages: usize) -> Self {
        Self {
            slot: Mutex::new(None),
            default_max_pages,
        }
    }

    /// Starts a new running session
    ///
    /// # Returns
    ///
    /// * `Ok(session)` - A fresh session, already `Running`
    /// * `Err(RippleError::CrawlInProgress)` - Another session is running
    pub fn begin(&self, max_pages: usize) -> Result<Arc<CrawlSession>> {
        let mut slot = lock(&self.slot);

        if let Some(existing) = slot.as_ref() {
            if existing.phase().is_running() {
                tracing::warn!("Refusing to start a crawl: one is already running");
                return Err(RippleError::CrawlInProgress);
            }
        }

        let session = Arc::new(CrawlSession::new(max_pages));
        session.transition(CrawlPhase::Running)?;
        *slot = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Returns the most recent session, running or finished
    pub fn current(&self) -> Option<Arc<CrawlSession>> {
        lock(&self.slot).clone()
    }

    pub fn is_running(&self) -> bool {
        self.current()
            .map(|session| session.phase().is_running())
            .unwrap_or(false)
    }

    /// Requests cancellation of the running session
    ///
    /// Returns false when nothing is running.
    pub fn stop(&self) -> bool {
        match self.current() {
            Some(session) if session.phase().is_running() => {
                tracing::info!("Stop requested for running crawl");
                session.cancel();
                true
            }
            _ => false,
        }
    }

    pub fn status(&self) -> CrawlStatus {
        self.status_at(Utc::now())
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> CrawlStatus {
        match self.current() {
            Some(session) => session.status_at(now),
            None => CrawlStatus {
                status: StatusLabel::Idle,
                pages_crawled: 0,
                total_pages: self.default_max_pages,
                progress_percentage: 0.0,
                current_url: None,
                start_time: None,
                estimated_completion: None,
            },
        }
    }
}
