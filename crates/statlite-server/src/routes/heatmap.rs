use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use statlite_core::hit::{truncate_field, HeatmapClick, Viewport};

use crate::{error::AppError, state::AppState};

/// `POST /api/heatmap/click` — beacon endpoint for one click.
///
/// Beacon callers (`navigator.sendBeacon`) never read the response, so this
/// always answers `202`; out-of-range coordinates are dropped inside the
/// store and storage failures are logged and swallowed.
#[tracing::instrument(skip(state, click))]
pub async fn record_click(
    State(state): State<Arc<AppState>>,
    Json(click): Json<HeatmapClick>,
) -> impl IntoResponse {
    let viewport = Viewport::parse_lenient(&click.viewport);
    let page_path = truncate_field(&click.page_path);

    if let Err(e) = state
        .db
        .record_click(page_path, viewport, click.x, click.y)
        .await
    {
        tracing::error!(error = %e, "Failed to store heatmap click — dropping");
    }

    (StatusCode::ACCEPTED, Json(json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
pub struct CellsQuery {
    pub page_path: String,
    #[serde(default)]
    pub viewport: Option<String>,
}

/// `GET /api/heatmap?page_path=&viewport=` — read back the accumulated grid
/// for one page and viewport class, hottest cells first, bounded by the
/// configured cap.
#[tracing::instrument(skip(state))]
pub async fn read_cells(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CellsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let viewport = Viewport::parse_lenient(query.viewport.as_deref().unwrap_or("desktop"));
    let cells = state
        .db
        .heatmap_cells(&query.page_path, viewport, state.config.heatmap_max_cells)
        .await?;
    Ok(Json(json!({ "cells": cells })))
}
