//! End-to-end search tests over a crawled corpus

use crate::{create_test_config, mount_page, url_of};
use ripple_search::search::SearchRequest;
use ripple_search::{SearchService, TraversalOrder};
use tempfile::TempDir;
use wiremock::MockServer;

/// Three pages chained p1 -> p2 -> p3 (depths 0, 1, 2)
async fn python_corpus() -> (MockServer, TempDir, SearchService) {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Python Programming Tutorial",
        "Learn Python programming from the ground up with examples.",
        &["/web"],
    )
    .await;
    mount_page(
        &server,
        "/web",
        "Web Development with Python",
        "Build websites and APIs using popular frameworks.",
        &["/data"],
    )
    .await;
    mount_page(
        &server,
        "/data",
        "Data Science Introduction",
        "Statistics, visualisation and machine learning basics.",
        &[],
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, TraversalOrder::BreadthFirst, 100, 3, &dir);
    let service = SearchService::open(config).unwrap();
    let outcome = service.crawl().await.unwrap();
    assert_eq!(outcome.pages_stored, 3);

    (server, dir, service)
}

#[tokio::test]
async fn test_title_match_ranks_highest() {
    let (server, _dir, service) = python_corpus().await;

    let response = service
        .search(&SearchRequest::new("Python programming"))
        .unwrap();

    assert_eq!(response.total_found, 2);
    assert_eq!(response.results[0].url, url_of(&server, "/"));
    assert_eq!(response.results[1].url, url_of(&server, "/web"));
    assert!(response.results[0].similarity_score >= response.results[1].similarity_score);
    assert!(!response.cached);
}

#[tokio::test]
async fn test_route_from_root() {
    let (server, _dir, service) = python_corpus().await;

    let response = service.search(&SearchRequest::new("data science")).unwrap();
    let hit = &response.results[0];
    assert_eq!(hit.url, url_of(&server, "/data"));

    let titles: Vec<_> = hit.route.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Python Programming Tutorial",
            "Web Development with Python",
            "Data Science Introduction"
        ]
    );
}

#[tokio::test]
async fn test_nonexistent_query() {
    let (_server, _dir, service) = python_corpus().await;

    let response = service
        .search(&SearchRequest::new("nonexistent query xyz123"))
        .unwrap();
    assert!(response.results.is_empty());
    assert_eq!(response.total_found, 0);
}

#[tokio::test]
async fn test_repeat_search_served_from_cache() {
    let (_server, _dir, service) = python_corpus().await;
    let request = SearchRequest::new("python");

    let first = service.search(&request).unwrap();
    let second = service.search(&SearchRequest::new("  PYTHON ")).unwrap();

    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(first.results, second.results);
    assert_eq!(first.total_found, second.total_found);

    let history = service.search_history(Some(10)).unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].cache_hit);
    assert_eq!(history[0].results_count, 2);

    assert_eq!(service.clear_cache().unwrap(), 1);
    assert!(!service.search(&request).unwrap().cached);
}

#[tokio::test]
async fn test_snippets_and_metadata() {
    let (server, _dir, service) = python_corpus().await;

    let response = service.search(&SearchRequest::new("websites")).unwrap();
    let hit = &response.results[0];
    assert_eq!(hit.url, url_of(&server, "/web"));
    assert_eq!(hit.domain, "127.0.0.1");
    assert!(hit.content_snippet.contains("Build websites"));
    assert!(!hit.content_snippet.ends_with("..."));
}

#[tokio::test]
async fn test_domain_filtering() {
    let (_server, _dir, service) = python_corpus().await;

    assert_eq!(service.list_domains().unwrap(), vec!["127.0.0.1".to_string()]);

    let all = service
        .search(&SearchRequest::new("python").domain("all"))
        .unwrap();
    assert_eq!(all.total_found, 2);

    let local = service
        .search(&SearchRequest::new("python").domain("127.0.0.1"))
        .unwrap();
    assert_eq!(local.total_found, 2);

    let other = service
        .search(&SearchRequest::new("python").domain("example.org"))
        .unwrap();
    assert_eq!(other.total_found, 0);
}

#[tokio::test]
async fn test_index_rebuilt_on_reopen() {
    let (server, dir, service) = python_corpus().await;
    drop(service);

    let config = create_test_config(&server, TraversalOrder::BreadthFirst, 100, 3, &dir);
    let reopened = SearchService::open(config).unwrap();

    let response = reopened.search(&SearchRequest::new("statistics")).unwrap();
    assert_eq!(response.total_found, 1);

    let stats = reopened.stats().unwrap();
    assert_eq!(stats.total_pages, 3);
    assert_eq!(stats.total_searches, 1);
    assert!(stats.index_size > 0);
}
