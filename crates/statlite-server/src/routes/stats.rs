use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use statlite_core::report::DateRange;

use crate::{error::AppError, state::AppState};

const DEFAULT_RANGE_DAYS: i64 = 30;
const DEFAULT_LIMIT: usize = 10;

/// Shared query parameters for the reporting endpoints. Dates are
/// `YYYY-MM-DD`; omitted bounds default to the last 30 days.
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<usize>,
}

impl StatsQuery {
    fn range(&self) -> Result<DateRange, AppError> {
        let today = Utc::now().date_naive();
        let start = match &self.start_date {
            Some(raw) => parse_date(raw)?,
            None => today - Duration::days(DEFAULT_RANGE_DAYS),
        };
        let end = match &self.end_date {
            Some(raw) => parse_date(raw)?,
            None => today,
        };
        DateRange::new(start, end).map_err(|e| AppError::BadRequest(e.to_string()))
    }

    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("invalid date: {raw} (expected YYYY-MM-DD)")))
}

/// `GET /api/stats/summary` — total hits and unique visitors for the range.
#[tracing::instrument(skip(state))]
pub async fn summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let summary = state.db.get_summary(query.range()?).await?;
    Ok(Json(json!(summary)))
}

/// `GET /api/stats/trends` — per-day hit/visitor series.
#[tracing::instrument(skip(state))]
pub async fn trends(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let trends = state.db.get_daily_trends(query.range()?).await?;
    Ok(Json(json!({ "trends": trends })))
}

/// `GET /api/stats/pages` — top pages by hits.
#[tracing::instrument(skip(state))]
pub async fn pages(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let pages = state.db.get_top_pages(query.range()?, query.limit()).await?;
    Ok(Json(json!({ "pages": pages })))
}

/// `GET /api/stats/referrers` — top referrer sources; direct traffic is
/// reported under the `"Direct"` label.
#[tracing::instrument(skip(state))]
pub async fn referrers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let referrers = state
        .db
        .get_top_referrers(query.range()?, query.limit())
        .await?;
    Ok(Json(json!({ "referrers": referrers })))
}

/// `GET /api/stats/devices` — device-type breakdown (raw-hit window only;
/// the daily rollup does not carry the device dimension).
#[tracing::instrument(skip(state))]
pub async fn devices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let devices = state.db.get_device_breakdown(query.range()?).await?;
    Ok(Json(json!({ "devices": devices })))
}

/// `GET /api/stats/os` — OS-family breakdown (raw-hit window only).
#[tracing::instrument(skip(state))]
pub async fn os(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let os = state.db.get_os_breakdown(query.range()?).await?;
    Ok(Json(json!({ "os": os })))
}

/// `GET /api/stats/hourly` — hits per hour over the trailing 24 hours,
/// zero-filled, oldest first.
#[tracing::instrument(skip(state))]
pub async fn hourly(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let hourly = state.db.get_hourly_histogram().await?;
    Ok(Json(json!({ "hourly": hourly })))
}
