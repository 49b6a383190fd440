//! Integration tests for Ripple-Search
//!
//! These tests use wiremock to serve small link graphs and run the full
//! crawl -> store -> index -> search cycle against a temporary database.

mod crawl_tests;
mod search_tests;

use ripple_search::config::{Config, CrawlerConfig, SearchConfig, StorageConfig, UserAgentConfig};
use ripple_search::TraversalOrder;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling the mock server
pub fn create_test_config(
    server: &MockServer,
    order: TraversalOrder,
    max_pages: usize,
    max_depth: u32,
    db_dir: &TempDir,
) -> Config {
    Config {
        crawler: CrawlerConfig {
            seed_urls: vec![format!("{}/", server.uri())],
            max_pages,
            max_depth,
            crawl_delay: 0.0,
            algorithm: order,
            request_timeout: 5,
            allowed_domains: vec!["127.0.0.1".to_string()],
            ..CrawlerConfig::default()
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: Some("https://example.com/contact".to_string()),
        },
        search: SearchConfig::default(),
        storage: StorageConfig {
            database_path: db_dir
                .path()
                .join("search_index.db")
                .to_string_lossy()
                .into_owned(),
        },
    }
}

/// Renders a minimal HTML page
pub fn html_page(title: &str, body: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "<html><head><title>{}</title></head><body><p>{}</p><nav>{}</nav></body></html>",
        title, body, anchors
    )
}

/// Serves an HTML page at `route`
pub async fn mount_page(server: &MockServer, route: &str, title: &str, body: &str, links: &[&str]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(html_page(title, body, links), "text/html"),
        )
        .mount(server)
        .await;
}

/// Absolute URL of `route` on the mock server
pub fn url_of(server: &MockServer, route: &str) -> String {
    format!("{}{}", server.uri(), route)
}
