//! End-to-end crawl tests against a mock HTTP server

use crate::{create_test_config, mount_page, url_of};
use ripple_search::search::SearchRequest;
use ripple_search::state::StatusLabel;
use ripple_search::{CrawlPhase, RippleError, SearchService, TraversalOrder};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// root -> {a, b}, a -> {a1, a2}, b -> {b1}
async fn mount_tree(server: &MockServer) {
    mount_page(server, "/", "Root", "root page", &["/a", "/b"]).await;
    mount_page(server, "/a", "A", "page a", &["/a1", "/a2"]).await;
    mount_page(server, "/b", "B", "page b", &["/b1"]).await;
    mount_page(server, "/a1", "A1", "page a1", &[]).await;
    mount_page(server, "/a2", "A2", "page a2", &[]).await;
    mount_page(server, "/b1", "B1", "page b1", &[]).await;
}

/// URLs of every stored page in storage order
fn stored_urls(service: &SearchService) -> Vec<String> {
    service
        .search(&SearchRequest::new("").limit(1000).use_cache(false))
        .unwrap()
        .results
        .into_iter()
        .map(|r| r.url)
        .collect()
}

fn position(urls: &[String], target: &str) -> usize {
    urls.iter()
        .position(|u| u == target)
        .unwrap_or_else(|| panic!("{} not crawled", target))
}

#[tokio::test]
async fn test_bfs_visits_levels_in_order() {
    let server = MockServer::start().await;
    mount_tree(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let config = create_test_config(&server, TraversalOrder::BreadthFirst, 100, 2, &dir);
    let service = SearchService::open(config).unwrap();
    let outcome = service.crawl().await.unwrap();

    assert_eq!(outcome.phase, CrawlPhase::Completed);
    assert_eq!(outcome.pages_crawled, 6);
    assert_eq!(outcome.pages_stored, 6);

    let urls = stored_urls(&service);
    assert_eq!(urls[0], url_of(&server, "/"));
    for shallow in ["/a", "/b"] {
        for deep in ["/a1", "/a2", "/b1"] {
            assert!(
                position(&urls, &url_of(&server, shallow)) < position(&urls, &url_of(&server, deep))
            );
        }
    }
}

#[tokio::test]
async fn test_dfs_follows_first_branch_first() {
    let server = MockServer::start().await;
    mount_tree(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let config = create_test_config(&server, TraversalOrder::DepthFirst, 100, 2, &dir);
    let service = SearchService::open(config).unwrap();
    service.crawl().await.unwrap();

    let expected: Vec<String> = ["/", "/a", "/a1", "/a2", "/b", "/b1"]
        .iter()
        .map(|p| url_of(&server, p))
        .collect();
    assert_eq!(stored_urls(&service), expected);
}

#[tokio::test]
async fn test_page_cap_respected_by_both_orders() {
    for order in [TraversalOrder::BreadthFirst, TraversalOrder::DepthFirst] {
        let server = MockServer::start().await;
        mount_tree(&server).await;
        let dir = tempfile::tempdir().unwrap();

        let config = create_test_config(&server, order, 3, 5, &dir);
        let service = SearchService::open(config).unwrap();
        let outcome = service.crawl().await.unwrap();

        assert_eq!(outcome.pages_crawled, 3);
        assert_eq!(service.stats().unwrap().total_pages, 3);
    }
}

#[tokio::test]
async fn test_cyclic_links_fetched_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            crate::html_page("Root", "root", &["/loop", "/", "/#top"]),
            "text/html",
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            crate::html_page("Loop", "loop", &["/", "/loop"]),
            "text/html",
        ))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    let config = create_test_config(&server, TraversalOrder::BreadthFirst, 100, 10, &dir);
    let service = SearchService::open(config).unwrap();
    let outcome = service.crawl().await.unwrap();

    assert_eq!(outcome.pages_crawled, 2);
    server.verify().await;
}

#[tokio::test]
async fn test_failed_and_rejected_pages_skipped() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Root",
        "root",
        &[
            "/missing",
            "/report",
            "/manual.pdf",
            "/admin/panel",
            "https://elsewhere.example/",
            "/ok",
        ],
    )
    .await;
    mount_page(&server, "/ok", "Ok", "fine", &[]).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/report"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-1.4", "application/pdf"))
        .mount(&server)
        .await;
    for excluded in ["/manual.pdf", "/admin/panel"] {
        Mock::given(method("GET"))
            .and(path(excluded))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
            .expect(0)
            .mount(&server)
            .await;
    }
    let dir = tempfile::tempdir().unwrap();

    let config = create_test_config(&server, TraversalOrder::BreadthFirst, 100, 2, &dir);
    let service = SearchService::open(config).unwrap();
    let outcome = service.crawl().await.unwrap();

    assert_eq!(outcome.phase, CrawlPhase::Completed);
    assert_eq!(
        stored_urls(&service),
        vec![url_of(&server, "/"), url_of(&server, "/ok")]
    );
    server.verify().await;
}

#[tokio::test]
async fn test_depth_recorded_through_routes() {
    let server = MockServer::start().await;
    mount_tree(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let config = create_test_config(&server, TraversalOrder::BreadthFirst, 100, 2, &dir);
    let service = SearchService::open(config).unwrap();
    service.crawl().await.unwrap();

    let response = service.search(&SearchRequest::new("a2")).unwrap();
    let hit = response
        .results
        .iter()
        .find(|r| r.url == url_of(&server, "/a2"))
        .unwrap();
    let route: Vec<_> = hit.route.iter().map(|s| s.url.clone()).collect();
    assert_eq!(
        route,
        vec![
            url_of(&server, "/"),
            url_of(&server, "/a"),
            url_of(&server, "/a2")
        ]
    );
}

#[tokio::test]
async fn test_missing_title_and_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "TestBot/1.0 (+https://example.com/contact)"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><body><p>untitled words</p></body></html>",
            "text/html",
        ))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    let config = create_test_config(&server, TraversalOrder::BreadthFirst, 100, 1, &dir);
    let service = SearchService::open(config).unwrap();
    service.crawl().await.unwrap();

    let response = service.search(&SearchRequest::new("untitled")).unwrap();
    assert_eq!(response.total_found, 1);
    assert_eq!(response.results[0].title, "No Title");
    server.verify().await;
}

#[tokio::test]
async fn test_second_crawl_rejected_and_stop() {
    let server = MockServer::start().await;
    mount_tree(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let mut config = create_test_config(&server, TraversalOrder::BreadthFirst, 100, 2, &dir);
    config.crawler.crawl_delay = 30.0;
    let service = SearchService::open(config).unwrap();

    let handle = service.start_crawl().unwrap();
    assert_eq!(service.crawl_status().status, StatusLabel::Crawling);
    assert!(matches!(
        service.start_crawl(),
        Err(RippleError::CrawlInProgress)
    ));

    // Let the first page land, then stop during the politeness delay
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(service.stop_crawl());

    let outcome = tokio::time::timeout(Duration::from_secs(10), handle.task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert_eq!(outcome.phase, CrawlPhase::Stopped);
    assert!(outcome.pages_stored >= 1);
    assert!(outcome.pages_stored < 6);
    assert_eq!(service.crawl_status().status, StatusLabel::Completed);

    // A finished session does not block the next crawl
    let next = service.start_crawl().unwrap();
    assert!(service.stop_crawl());
    let _ = next.task.await;
}

#[tokio::test]
async fn test_recrawl_updates_in_place() {
    let server = MockServer::start().await;
    mount_tree(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let config = create_test_config(&server, TraversalOrder::BreadthFirst, 100, 2, &dir);
    let service = SearchService::open(config).unwrap();
    service.crawl().await.unwrap();
    service.crawl().await.unwrap();

    let stats = service.stats().unwrap();
    assert_eq!(stats.total_pages, 6);
    assert_eq!(stats.total_links, 5);
    assert_eq!(stats.domains, vec!["127.0.0.1".to_string()]);
}
