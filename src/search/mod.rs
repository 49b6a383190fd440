//! Ranked keyword search
//!
//! - `text`: cleaning, tokenization, stop words, n-grams
//! - `index`: TF-IDF vectors and cosine ranking, swapped in atomically on rebuild
//! - `cache`: TTL result cache and search history
//! - `engine`: the search flow tying them to storage

mod cache;
mod engine;
mod index;
mod text;

pub use cache::{cache_key, QueryCache, ALL_DOMAINS};
pub use engine::{snippet, SearchEngine, SearchRequest, SearchResponse, SearchResult, DEFAULT_LIMIT};
pub use index::{Document, ScoredDocument, SearchIndex, TermIndex, MAX_DOCUMENT_FREQUENCY, MIN_SCORE};
pub use text::{clean_text, is_stop_word, terms, tokenize};
