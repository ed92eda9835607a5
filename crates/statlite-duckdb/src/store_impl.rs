//! [`AnalyticsStore`] implementation delegating to the inherent methods.

use statlite_core::hit::{HeatmapCell, Hit, Viewport};
use statlite_core::report::{
    BreakdownRow, DateRange, HourlyPoint, PageCount, ReferrerCount, Summary, TrendPoint,
};
use statlite_core::store::{AggregationOutcome, AnalyticsStore};

use crate::DuckDbBackend;

#[async_trait::async_trait]
impl AnalyticsStore for DuckDbBackend {
    async fn insert_hits(&self, hits: &[Hit]) -> anyhow::Result<()> {
        DuckDbBackend::insert_hits(self, hits).await
    }

    async fn aggregate(&self) -> anyhow::Result<AggregationOutcome> {
        self.aggregate_hits().await
    }

    async fn record_click(
        &self,
        page_path: &str,
        viewport: Viewport,
        x: u32,
        y: u32,
    ) -> anyhow::Result<()> {
        DuckDbBackend::record_click(self, page_path, viewport, x, y).await
    }

    async fn heatmap_cells(
        &self,
        page_path: &str,
        viewport: Viewport,
        cap: usize,
    ) -> anyhow::Result<Vec<HeatmapCell>> {
        DuckDbBackend::heatmap_cells(self, page_path, viewport, cap).await
    }

    async fn get_summary(&self, range: DateRange) -> anyhow::Result<Summary> {
        DuckDbBackend::get_summary(self, range).await
    }

    async fn get_daily_trends(&self, range: DateRange) -> anyhow::Result<Vec<TrendPoint>> {
        DuckDbBackend::get_daily_trends(self, range).await
    }

    async fn get_top_pages(
        &self,
        range: DateRange,
        limit: usize,
    ) -> anyhow::Result<Vec<PageCount>> {
        DuckDbBackend::get_top_pages(self, range, limit).await
    }

    async fn get_top_referrers(
        &self,
        range: DateRange,
        limit: usize,
    ) -> anyhow::Result<Vec<ReferrerCount>> {
        DuckDbBackend::get_top_referrers(self, range, limit).await
    }

    async fn get_device_breakdown(&self, range: DateRange) -> anyhow::Result<Vec<BreakdownRow>> {
        DuckDbBackend::get_device_breakdown(self, range).await
    }

    async fn get_os_breakdown(&self, range: DateRange) -> anyhow::Result<Vec<BreakdownRow>> {
        DuckDbBackend::get_os_breakdown(self, range).await
    }

    async fn get_hourly_histogram(&self) -> anyhow::Result<Vec<HourlyPoint>> {
        DuckDbBackend::get_hourly_histogram(self).await
    }
}
