//! Configuration module for Ripple-Search
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section and key is optional; missing values fall back to defaults.
//!
//! # Example
//!
//! ```no_run
//! use ripple_search::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, SearchConfig, StorageConfig, UserAgentConfig, MAX_CACHE_TTL_SECS,
    MAX_CRAWL_DELAY_SECS,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, config_fingerprint, load_config, load_config_with_hash, parse_config,
};
