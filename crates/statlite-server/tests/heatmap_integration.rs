use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use statlite_core::config::Config;
use statlite_duckdb::DuckDbBackend;
use statlite_server::app::build_app;
use statlite_server::state::AppState;

fn test_config() -> Config {
    Config {
        port: 0,
        data_dir: "/tmp/statlite-test".to_string(),
        site_host: "example.com".to_string(),
        aggregate_interval_secs: 3600,
        heatmap_max_cells: 2000,
        duckdb_memory_limit: "256MB".to_string(),
        cors_origins: vec![],
        excluded_paths: vec!["/admin".to_string()],
    }
}

fn setup() -> (Arc<AppState>, axum::Router) {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    let state = Arc::new(AppState::new(db, test_config()));
    let app = build_app(Arc::clone(&state));
    (state, app)
}

fn click_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/heatmap/click")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn json_body(response: axum::http::Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn click_beacon_accumulates_cells() {
    let (_state, app) = setup();

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(click_request(json!({
                "page_path": "/landing",
                "viewport": "mobile",
                "x": 48,
                "y": 12
            })))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/heatmap?page_path=/landing&viewport=mobile")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let cells = body["cells"].as_array().expect("cells array");
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0]["x"], 48);
    assert_eq!(cells[0]["y"], 12);
    assert_eq!(cells[0]["count"], 2);
}

#[tokio::test]
async fn unknown_viewport_coerces_to_desktop() {
    let (_state, app) = setup();

    app.clone()
        .oneshot(click_request(json!({
            "page_path": "/",
            "viewport": "watch",
            "x": 10,
            "y": 3
        })))
        .await
        .expect("response");

    // Read back without a viewport param: defaults to desktop.
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/heatmap?page_path=/")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    let body = json_body(response).await;
    assert_eq!(body["cells"].as_array().expect("cells").len(), 1);
}

#[tokio::test]
async fn out_of_range_click_is_accepted_but_dropped() {
    let (state, app) = setup();

    let response = app
        .oneshot(click_request(json!({
            "page_path": "/",
            "viewport": "desktop",
            "x": 150,
            "y": 0
        })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let cells = state
        .db
        .heatmap_cells("/", statlite_core::hit::Viewport::Desktop, 2000)
        .await
        .expect("cells");
    assert!(cells.is_empty());
}
