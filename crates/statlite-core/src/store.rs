//! Storage backend abstraction.

use serde::Serialize;

use crate::hit::{HeatmapCell, Hit, Viewport};
use crate::report::{BreakdownRow, DateRange, HourlyPoint, PageCount, ReferrerCount, Summary, TrendPoint};

/// What one aggregation run accomplished.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct AggregationOutcome {
    /// Raw hits drained from the event store.
    pub hits_processed: usize,
    /// Distinct (date, page, referrer) buckets merged into daily stats.
    pub buckets_merged: usize,
}

/// The storage seam between the tracking/aggregation core and a concrete
/// database backend.
///
/// Write paths (`insert_hits`, `record_click`) must be safe under many
/// concurrent callers; `aggregate` assumes non-overlapping invocations (the
/// scheduler serializes runs).
#[async_trait::async_trait]
pub trait AnalyticsStore: Send + Sync + 'static {
    /// Append raw hits to the event store.
    async fn insert_hits(&self, hits: &[Hit]) -> anyhow::Result<()>;

    /// Run one aggregation cycle: drain raw hits, merge into daily stats,
    /// prune the event store on full success. A failed run retains the raw
    /// hits so the next scheduled run retries them.
    async fn aggregate(&self) -> anyhow::Result<AggregationOutcome>;

    /// Atomically insert-or-increment one heatmap cell. Out-of-range `x`
    /// (> 100) is silently dropped.
    async fn record_click(
        &self,
        page_path: &str,
        viewport: Viewport,
        x: u32,
        y: u32,
    ) -> anyhow::Result<()>;

    /// Read heatmap cells for one page and viewport, at most `cap` rows.
    async fn heatmap_cells(
        &self,
        page_path: &str,
        viewport: Viewport,
        cap: usize,
    ) -> anyhow::Result<Vec<HeatmapCell>>;

    async fn get_summary(&self, range: DateRange) -> anyhow::Result<Summary>;

    async fn get_daily_trends(&self, range: DateRange) -> anyhow::Result<Vec<TrendPoint>>;

    async fn get_top_pages(&self, range: DateRange, limit: usize)
        -> anyhow::Result<Vec<PageCount>>;

    async fn get_top_referrers(
        &self,
        range: DateRange,
        limit: usize,
    ) -> anyhow::Result<Vec<ReferrerCount>>;

    async fn get_device_breakdown(&self, range: DateRange) -> anyhow::Result<Vec<BreakdownRow>>;

    async fn get_os_breakdown(&self, range: DateRange) -> anyhow::Result<Vec<BreakdownRow>>;

    /// Hit counts per hour for the trailing 24 hours, oldest first, missing
    /// hours filled with zero.
    async fn get_hourly_histogram(&self) -> anyhow::Result<Vec<HourlyPoint>>;
}
