use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
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

/// The router is served with connect-info in main; oneshot requests inject
/// the peer address as a request extension instead.
fn peer() -> ConnectInfo<SocketAddr> {
    ConnectInfo("203.0.113.9:50000".parse().expect("addr"))
}

fn track_request(body: Value, user_agent: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/track")
        .header("content-type", "application/json")
        .header("x-forwarded-for", "198.51.100.10")
        .extension(peer());
    if !user_agent.is_empty() {
        builder = builder.header("user-agent", user_agent);
    }
    builder.body(Body::from(body.to_string())).expect("request")
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

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/120";

#[tokio::test]
async fn health_reports_ok() {
    let (_state, app) = setup();
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn tracked_hit_lands_in_storage() {
    let (state, app) = setup();

    let response = app
        .oneshot(track_request(
            json!({ "path": "/blog/post", "referrer": "https://www.google.com/search" }),
            BROWSER_UA,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = json_body(response).await;
    assert_eq!(body["ok"], true);

    assert_eq!(state.db.pending_hit_count().await.expect("count"), 1);
}

#[tokio::test]
async fn bot_requests_are_accepted_but_not_stored() {
    let (state, app) = setup();
    let response = app
        .oneshot(track_request(
            json!({ "path": "/" }),
            "Mozilla/5.0 (compatible; Googlebot/2.1)",
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(state.db.pending_hit_count().await.expect("count"), 0);
}

#[tokio::test]
async fn empty_user_agent_is_dropped() {
    let (state, app) = setup();
    let response = app
        .oneshot(track_request(json!({ "path": "/" }), ""))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(state.db.pending_hit_count().await.expect("count"), 0);
}

#[tokio::test]
async fn not_found_pages_are_dropped() {
    let (state, app) = setup();
    let response = app
        .oneshot(track_request(
            json!({ "path": "/missing", "status": 404 }),
            BROWSER_UA,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(state.db.pending_hit_count().await.expect("count"), 0);
}

#[tokio::test]
async fn excluded_path_prefixes_are_dropped() {
    let (state, app) = setup();
    let response = app
        .oneshot(track_request(
            json!({ "path": "/admin/settings" }),
            BROWSER_UA,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(state.db.pending_hit_count().await.expect("count"), 0);
}

#[tokio::test]
async fn internal_referrers_are_stored_as_direct() {
    let (state, app) = setup();
    app.oneshot(track_request(
        json!({ "path": "/pricing", "referrer": "https://www.example.com/" }),
        BROWSER_UA,
    ))
    .await
    .expect("response");

    // The hit exists but carries no referrer label.
    assert_eq!(state.db.pending_hit_count().await.expect("count"), 1);
    let referrers = state
        .db
        .get_top_referrers(last_week(), 10)
        .await
        .expect("referrers");
    assert_eq!(referrers.len(), 1);
    assert_eq!(referrers[0].referrer, "Direct");
}

#[tokio::test]
async fn repeat_visits_share_a_visitor_hash() {
    let (state, app) = setup();
    for _ in 0..3 {
        app.clone()
            .oneshot(track_request(json!({ "path": "/" }), BROWSER_UA))
            .await
            .expect("response");
    }
    let summary = state.db.get_summary(last_week()).await.expect("summary");
    assert_eq!(summary.total_hits, 3);
    assert_eq!(summary.unique_visitors, 1);
}

fn last_week() -> statlite_core::report::DateRange {
    let today = chrono::Utc::now().date_naive();
    statlite_core::report::DateRange::new(today - chrono::Duration::days(7), today)
        .expect("range")
}
