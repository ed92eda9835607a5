use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware is applied in outer-to-inner order (outermost runs first on
/// request, last on response):
///
/// 1. `TraceLayer` — structured request/response logging via `tracing`.
/// 2. `CorsLayer` — the tracking snippet and the click beacon run on pages
///    served by the monitored site, which may live on another origin than
///    this collector; browsers need CORS headers on both write endpoints.
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/track", post(routes::track::track))
        .route("/api/heatmap/click", post(routes::heatmap::record_click))
        .route("/api/heatmap", get(routes::heatmap::read_cells))
        .route("/api/stats/summary", get(routes::stats::summary))
        .route("/api/stats/trends", get(routes::stats::trends))
        .route("/api/stats/pages", get(routes::stats::pages))
        .route("/api/stats/referrers", get(routes::stats::referrers))
        .route("/api/stats/devices", get(routes::stats::devices))
        .route("/api/stats/os", get(routes::stats::os))
        .route("/api/stats/hourly", get(routes::stats::hourly))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// An empty origin list means any origin; otherwise only the configured
/// origins are allowed. Origins that fail to parse as header values are
/// skipped with a warning rather than aborting startup.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods(Any)
        .allow_headers(Any)
}
