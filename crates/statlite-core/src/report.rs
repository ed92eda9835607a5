//! Reporting result types returned by the read-query layer.
//!
//! Every report merges two sources: the `daily_stats` rollups (already
//! aggregated) and the raw `hits` tail (not yet aggregated). Hit counts sum
//! exactly; visitor counts sum as an approximation because the raw tail and
//! the rollups cannot share a visitor set.

use chrono::NaiveDate;
use serde::Serialize;

/// Inclusive date range for report queries.
#[derive(Debug, Clone, Copy)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> anyhow::Result<Self> {
        if end < start {
            anyhow::bail!("end_date must be on or after start_date");
        }
        Ok(Self { start, end })
    }
}

/// Totals for a date range.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total_hits: u64,
    pub unique_visitors: u64,
}

/// One day in the daily trend series.
#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub hits: u64,
    pub visitors: u64,
}

/// One row of the top-pages report.
#[derive(Debug, Clone, Serialize)]
pub struct PageCount {
    pub page_path: String,
    pub hits: u64,
    pub visitors: u64,
}

/// One row of the top-referrers report. Direct traffic appears under the
/// label `"Direct"`.
#[derive(Debug, Clone, Serialize)]
pub struct ReferrerCount {
    pub referrer: String,
    pub hits: u64,
    pub visitors: u64,
}

/// One row of a device-type or OS breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct BreakdownRow {
    pub label: String,
    pub hits: u64,
    pub visitors: u64,
}

/// One hour of the trailing-24h histogram.
#[derive(Debug, Clone, Serialize)]
pub struct HourlyPoint {
    /// `HH:00` label.
    pub hour: String,
    pub hits: u64,
}
