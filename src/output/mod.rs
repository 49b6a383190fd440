//! Output module for command results
//!
//! This module handles:
//! - Engine statistics (gathering and the formatted report)
//! - JSON rendering of structured results

pub mod stats;

pub use stats::{format_statistics, load_statistics, print_statistics, EngineStats};

use serde::Serialize;

/// Renders a value as pretty-printed JSON
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Prints a value as pretty-printed JSON to stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", to_pretty_json(value)?);
    Ok(())
}
