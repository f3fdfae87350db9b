mod common;

use axum::http::StatusCode;
use common::TestApp;

#[tokio::test]
async fn test_index_page_is_cached() {
    let app = TestApp::new().await;
    let barney = app.user("Barney").await;

    let first = app.get("/", None).await;
    assert_eq!(first.status, StatusCode::OK);

    app.post(&barney.user, "cached away", None, false).await;

    let second = app.get("/", None).await;
    assert!(!second.body.contains("cached away"));
    assert_eq!(first.body, second.body);

    app.state.page_cache.clear();
    let third = app.get("/", None).await;
    assert!(third.body.contains("cached away"));
}

#[tokio::test]
async fn test_index_cache_is_per_page() {
    let app = TestApp::new().await;
    let barney = app.user("Barney").await;
    for i in 0..6 {
        app.post(&barney.user, &format!("entry {}", i), None, false).await;
    }

    let first = app.get("/", None).await;
    let second = app.get("/?page=2", None).await;
    assert!(first.body.contains("entry 5"));
    assert!(second.body.contains("entry 0"));
    assert!(!second.body.contains("entry 5"));
    assert_eq!(app.state.page_cache.len(), 2);
}

#[tokio::test]
async fn test_cached_listing_keeps_viewer_header() {
    let app = TestApp::new().await;
    let barney = app.user("Barney").await;

    app.get("/", None).await;
    let response = app.get("/", Some(&barney)).await;
    assert!(response.body.contains("/auth/logout/"));
}
