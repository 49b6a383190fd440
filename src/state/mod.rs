//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: lifecycle of a crawl session (idle, running, completed, stopped)
//! - `StatusLabel`: the coarse status reported to callers

mod crawl_state;

// Re-export main types
pub use crawl_state::{CrawlPhase, StatusLabel};
