//! Integration tests for the static page, fallback, and health endpoint.

mod helpers;

use axum::http::StatusCode;
use serde_json::Value;

use helpers::TestApp;

#[tokio::test]
async fn test_root_serves_page() {
    let app = TestApp::new();

    let response = app.request("GET", "/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(
        response
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("text/html"))
    );
    assert_eq!(response.body, app.state.page.html());
}

#[tokio::test]
async fn test_index_html_alias() {
    let app = TestApp::new();

    let response = app.request("GET", "/index.html").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, app.state.page.html());
}

#[tokio::test]
async fn test_unknown_path_not_found() {
    let app = TestApp::new();

    for path in ["/missing", "/public/index.html", "/api/unknown"] {
        let response = app.request("GET", path).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "path {path}");
        assert_eq!(response.body, "Not Found");
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/health").await;

    assert_eq!(response.status, StatusCode::OK);
    let body: Value = serde_json::from_str(&response.body).expect("json");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["connections"], 0);
    assert_eq!(body["metrics"]["messages_received"], 0);
}

#[tokio::test]
async fn test_health_reports_live_connections() {
    let app = TestApp::new();
    let (_handle, _rx) = app.state.realtime.hub.on_connect().expect("connect");

    let response = app.request("GET", "/api/health").await;

    let body: Value = serde_json::from_str(&response.body).expect("json");
    assert_eq!(body["connections"], 1);
    assert_eq!(body["metrics"]["connections_opened"], 1);
}
