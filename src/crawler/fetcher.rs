//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent and headers
//! - GET requests with bounded connect and total timeouts
//! - Content-Type filtering
//! - Error classification into `FetchFailure`
//!
//! A failed fetch never aborts a crawl: the traversal records it as
//! "page contributes nothing" and moves on.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::parser::parse_html;
use crate::crawler::record::NO_TITLE;
use crate::url::UrlPolicy;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const ACCEPT_VALUE: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.5";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_REDIRECTS: usize = 10;

/// A successfully fetched and parsed page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,

    /// HTTP status code (always 200)
    pub status_code: u16,

    /// Page title, `No Title` when absent
    pub title: String,

    /// Visible text
    pub content: String,

    /// Outbound links that passed the URL policy, normalized, first occurrence order
    pub links: Vec<String>,
}

/// Reasons a fetch produced no page
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Unaccepted content type: {0}")]
    ContentMismatch(String),

    #[error("Failed to read body: {0}")]
    Body(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for FetchFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchFailure::Timeout
        } else if e.is_connect() {
            FetchFailure::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            FetchFailure::Body(e.to_string())
        } else {
            FetchFailure::Network(e.to_string())
        }
    }
}

/// Something that can turn a URL into a parsed page
///
/// The traversal engine is generic over this so tests can drive it with an
/// in-memory link graph.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<FetchedPage, FetchFailure>> + Send;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `crawler` - Crawler settings (request timeout, connection pool size)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use ripple_search::config::{CrawlerConfig, UserAgentConfig};
/// use ripple_search::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));

    Client::builder()
        .user_agent(user_agent.header_value())
        .default_headers(headers)
        .timeout(Duration::from_secs(crawler.request_timeout))
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .pool_max_idle_per_host(crawler.max_concurrent_requests as usize)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns true if the Content-Type header value is acceptable
///
/// A missing header is accepted, and so is everything when no types are
/// configured. Matching is a case-insensitive prefix test.
pub fn content_type_accepted(content_type: Option<&str>, accepted: &[String]) -> bool {
    let content_type = match content_type {
        Some(ct) => ct.trim().to_ascii_lowercase(),
        None => return true,
    };

    if accepted.is_empty() {
        return true;
    }

    accepted
        .iter()
        .any(|prefix| content_type.starts_with(&prefix.trim().to_ascii_lowercase()))
}

/// reqwest-backed page fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    content_types: Vec<String>,
    policy: UrlPolicy,
}

impl HttpFetcher {
    pub fn new(client: Client, content_types: Vec<String>, policy: UrlPolicy) -> Self {
        Self {
            client,
            content_types,
            policy,
        }
    }

    /// Builds a fetcher with a fresh client from configuration
    pub fn from_config(
        user_agent: &UserAgentConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, crawler)?;
        Ok(Self::new(
            client,
            crawler.content_types.clone(),
            UrlPolicy::from_config(crawler),
        ))
    }

    async fn fetch_page(&self, url: &Url) -> Result<FetchedPage, FetchFailure> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !content_type_accepted(content_type.as_deref(), &self.content_types) {
            return Err(FetchFailure::ContentMismatch(
                content_type.unwrap_or_default(),
            ));
        }

        let final_url = response.url().clone();
        let body = response.text().await?;

        let parsed = parse_html(&body, &final_url);
        let links = parsed
            .links
            .iter()
            .filter_map(|link| self.policy.admit(link))
            .map(|link| link.to_string())
            .fold(Vec::new(), |mut acc, link| {
                if !acc.contains(&link) {
                    acc.push(link);
                }
                acc
            });

        Ok(FetchedPage {
            final_url,
            status_code: status.as_u16(),
            title: parsed.title.unwrap_or_else(|| NO_TITLE.to_string()),
            content: parsed.text,
            links,
        })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<FetchedPage, FetchFailure>> + Send {
        self.fetch_page(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> (UserAgentConfig, CrawlerConfig) {
        let user_agent = UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: Some("https://example.com/about".to_string()),
        };
        (user_agent, CrawlerConfig::default())
    }

    #[test]
    fn test_build_http_client() {
        let (user_agent, crawler) = create_test_config();
        assert!(build_http_client(&user_agent, &crawler).is_ok());
    }

    #[test]
    fn test_fetcher_from_config() {
        let (user_agent, crawler) = create_test_config();
        assert!(HttpFetcher::from_config(&user_agent, &crawler).is_ok());
    }

    #[test]
    fn test_content_type_accepted() {
        let accepted = vec!["text/html".to_string(), "text/plain".to_string()];
        assert!(content_type_accepted(Some("text/html"), &accepted));
        assert!(content_type_accepted(Some("text/html; charset=utf-8"), &accepted));
        assert!(content_type_accepted(Some("Text/HTML"), &accepted));
        assert!(content_type_accepted(Some("text/plain"), &accepted));
        assert!(!content_type_accepted(Some("application/pdf"), &accepted));
        assert!(!content_type_accepted(Some("image/png"), &accepted));
    }

    #[test]
    fn test_missing_content_type_accepted() {
        let accepted = vec!["text/html".to_string()];
        assert!(content_type_accepted(None, &accepted));
    }

    #[test]
    fn test_empty_accept_list_accepts_all() {
        assert!(content_type_accepted(Some("application/octet-stream"), &[]));
    }

    #[test]
    fn test_failure_display() {
        assert_eq!(FetchFailure::Status(404).to_string(), "HTTP status 404");
        assert_eq!(FetchFailure::Timeout.to_string(), "Request timeout");
    }
}
