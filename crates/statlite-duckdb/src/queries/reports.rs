//! Merged reporting queries over `daily_stats` + the raw `hits` tail.
//!
//! Every range query reads both sources and sums them: the rollups cover
//! everything up to the last successful aggregation, the raw tail covers
//! everything since. Nothing is double-counted because aggregation prunes
//! the raw rows it rolled up. Hit counts are exact; visitor counts across
//! the boundary are an approximation (the two sides cannot share a visitor
//! set, so their distinct counts are summed).

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use chrono::{Duration, DurationRound, Utc};

use statlite_core::report::{
    BreakdownRow, DateRange, HourlyPoint, PageCount, ReferrerCount, Summary, TrendPoint,
};

use crate::DuckDbBackend;

/// Raw-hits time bounds for an inclusive date range: `[start 00:00, end+1d)`.
fn raw_bounds(range: &DateRange) -> (String, String) {
    let start = format!("{} 00:00:00", range.start.format("%Y-%m-%d"));
    let end = format!(
        "{} 00:00:00",
        (range.end + Duration::days(1)).format("%Y-%m-%d")
    );
    (start, end)
}

fn date_params(range: &DateRange) -> (String, String) {
    (
        range.start.format("%Y-%m-%d").to_string(),
        range.end.format("%Y-%m-%d").to_string(),
    )
}

#[derive(Default, Clone, Copy)]
struct Counts {
    hits: u64,
    visitors: u64,
}

impl DuckDbBackend {
    /// Totals for a date range: aggregated rollups plus the raw tail.
    pub async fn get_summary(&self, range: DateRange) -> Result<Summary> {
        let conn = self.conn.lock().await;
        let (date_start, date_end) = date_params(&range);
        let (ts_start, ts_end) = raw_bounds(&range);

        let (agg_hits, agg_visitors): (i64, i64) = conn
            .prepare(
                "SELECT COALESCE(SUM(hit_count), 0), COALESCE(SUM(unique_visitors), 0) \
                 FROM daily_stats \
                 WHERE stat_date BETWEEN CAST(?1 AS DATE) AND CAST(?2 AS DATE)",
            )?
            .query_row(duckdb::params![date_start, date_end], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;

        let (raw_hits, raw_visitors): (i64, i64) = conn
            .prepare(
                "SELECT COUNT(*), COUNT(DISTINCT visitor_hash) FROM hits \
                 WHERE hit_date >= CAST(?1 AS TIMESTAMP) AND hit_date < CAST(?2 AS TIMESTAMP)",
            )?
            .query_row(duckdb::params![ts_start, ts_end], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;

        Ok(Summary {
            total_hits: (agg_hits + raw_hits) as u64,
            unique_visitors: (agg_visitors + raw_visitors) as u64,
        })
    }

    /// Per-day series for the range, ascending by date. Days with no
    /// traffic on either side are omitted.
    pub async fn get_daily_trends(&self, range: DateRange) -> Result<Vec<TrendPoint>> {
        let conn = self.conn.lock().await;
        let (date_start, date_end) = date_params(&range);
        let (ts_start, ts_end) = raw_bounds(&range);

        // BTreeMap keys are YYYY-MM-DD strings, so iteration is date order.
        let mut merged: BTreeMap<String, Counts> = BTreeMap::new();

        let mut stmt = conn.prepare(
            "SELECT strftime(stat_date, '%Y-%m-%d'), SUM(hit_count), SUM(unique_visitors) \
             FROM daily_stats \
             WHERE stat_date BETWEEN CAST(?1 AS DATE) AND CAST(?2 AS DATE) \
             GROUP BY stat_date",
        )?;
        let aggregated = stmt.query_map(duckdb::params![date_start, date_end], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        for row in aggregated {
            let (date, hits, visitors) = row?;
            let entry = merged.entry(date).or_default();
            entry.hits += hits as u64;
            entry.visitors += visitors as u64;
        }

        let mut stmt = conn.prepare(
            "SELECT strftime(hit_date, '%Y-%m-%d'), COUNT(*), COUNT(DISTINCT visitor_hash) \
             FROM hits \
             WHERE hit_date >= CAST(?1 AS TIMESTAMP) AND hit_date < CAST(?2 AS TIMESTAMP) \
             GROUP BY strftime(hit_date, '%Y-%m-%d')",
        )?;
        let raw = stmt.query_map(duckdb::params![ts_start, ts_end], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        for row in raw {
            let (date, hits, visitors) = row?;
            let entry = merged.entry(date).or_default();
            entry.hits += hits as u64;
            entry.visitors += visitors as u64;
        }

        Ok(merged
            .into_iter()
            .map(|(date, c)| TrendPoint {
                date,
                hits: c.hits,
                visitors: c.visitors,
            })
            .collect())
    }

    /// Top pages by hits, descending, at most `limit` rows.
    pub async fn get_top_pages(&self, range: DateRange, limit: usize) -> Result<Vec<PageCount>> {
        let merged = self
            .merged_grouped_counts(
                range,
                "SELECT page_path, SUM(hit_count), SUM(unique_visitors) \
                 FROM daily_stats \
                 WHERE stat_date BETWEEN CAST(?1 AS DATE) AND CAST(?2 AS DATE) \
                 GROUP BY page_path",
                "SELECT page_path, COUNT(*), COUNT(DISTINCT visitor_hash) \
                 FROM hits \
                 WHERE hit_date >= CAST(?1 AS TIMESTAMP) AND hit_date < CAST(?2 AS TIMESTAMP) \
                 GROUP BY page_path",
            )
            .await?;
        Ok(top_n(merged, limit)
            .into_iter()
            .map(|(page_path, c)| PageCount {
                page_path,
                hits: c.hits,
                visitors: c.visitors,
            })
            .collect())
    }

    /// Top referrer sources by hits, descending. Direct traffic (NULL
    /// referrer) appears under the label `"Direct"`.
    pub async fn get_top_referrers(
        &self,
        range: DateRange,
        limit: usize,
    ) -> Result<Vec<ReferrerCount>> {
        let merged = self
            .merged_grouped_counts(
                range,
                "SELECT COALESCE(referrer, 'Direct'), SUM(hit_count), SUM(unique_visitors) \
                 FROM daily_stats \
                 WHERE stat_date BETWEEN CAST(?1 AS DATE) AND CAST(?2 AS DATE) \
                 GROUP BY COALESCE(referrer, 'Direct')",
                "SELECT COALESCE(referrer, 'Direct'), COUNT(*), COUNT(DISTINCT visitor_hash) \
                 FROM hits \
                 WHERE hit_date >= CAST(?1 AS TIMESTAMP) AND hit_date < CAST(?2 AS TIMESTAMP) \
                 GROUP BY COALESCE(referrer, 'Direct')",
            )
            .await?;
        Ok(top_n(merged, limit)
            .into_iter()
            .map(|(referrer, c)| ReferrerCount {
                referrer,
                hits: c.hits,
                visitors: c.visitors,
            })
            .collect())
    }

    /// Device-type breakdown. Raw hits only: the daily rollup does not
    /// carry the device dimension, so this covers the unaggregated window.
    pub async fn get_device_breakdown(&self, range: DateRange) -> Result<Vec<BreakdownRow>> {
        self.raw_breakdown(range, "device_type").await
    }

    /// OS-family breakdown. Raw hits only, same caveat as device types.
    pub async fn get_os_breakdown(&self, range: DateRange) -> Result<Vec<BreakdownRow>> {
        self.raw_breakdown(range, "os").await
    }

    /// Hit counts per hour for the trailing 24 hours, oldest first, with
    /// missing hours zero-filled.
    pub async fn get_hourly_histogram(&self) -> Result<Vec<HourlyPoint>> {
        let conn = self.conn.lock().await;
        let now = Utc::now();
        let window_start = (now - Duration::hours(23)).duration_trunc(Duration::hours(1))?;
        let start_str = window_start.format("%Y-%m-%d %H:%M:%S").to_string();

        let mut stmt = conn.prepare(
            "SELECT strftime(date_trunc('hour', hit_date), '%Y-%m-%d %H'), COUNT(*) \
             FROM hits \
             WHERE hit_date >= CAST(?1 AS TIMESTAMP) \
             GROUP BY date_trunc('hour', hit_date)",
        )?;
        let rows = stmt.query_map(duckdb::params![start_str], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut by_hour: HashMap<String, u64> = HashMap::new();
        for row in rows {
            let (hour_key, hits) = row?;
            by_hour.insert(hour_key, hits as u64);
        }

        let mut points = Vec::with_capacity(24);
        for i in 0..24 {
            let hour = window_start + Duration::hours(i);
            let key = hour.format("%Y-%m-%d %H").to_string();
            points.push(HourlyPoint {
                hour: hour.format("%H:00").to_string(),
                hits: by_hour.get(&key).copied().unwrap_or(0),
            });
        }
        Ok(points)
    }

    /// Run one aggregated and one raw grouped-count query with the same
    /// (label, hits, visitors) shape and sum them per label.
    async fn merged_grouped_counts(
        &self,
        range: DateRange,
        aggregated_sql: &str,
        raw_sql: &str,
    ) -> Result<HashMap<String, Counts>> {
        let conn = self.conn.lock().await;
        let (date_start, date_end) = date_params(&range);
        let (ts_start, ts_end) = raw_bounds(&range);

        let mut merged: HashMap<String, Counts> = HashMap::new();

        let mut stmt = conn.prepare(aggregated_sql)?;
        let aggregated = stmt.query_map(duckdb::params![date_start, date_end], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        for row in aggregated {
            let (label, hits, visitors) = row?;
            let entry = merged.entry(label).or_default();
            entry.hits += hits as u64;
            entry.visitors += visitors as u64;
        }

        let mut stmt = conn.prepare(raw_sql)?;
        let raw = stmt.query_map(duckdb::params![ts_start, ts_end], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        for row in raw {
            let (label, hits, visitors) = row?;
            let entry = merged.entry(label).or_default();
            entry.hits += hits as u64;
            entry.visitors += visitors as u64;
        }

        Ok(merged)
    }

    async fn raw_breakdown(&self, range: DateRange, column: &str) -> Result<Vec<BreakdownRow>> {
        let conn = self.conn.lock().await;
        let (ts_start, ts_end) = raw_bounds(&range);

        // `column` is a compile-time constant name, never user input.
        let sql = format!(
            "SELECT {column}, COUNT(*), COUNT(DISTINCT visitor_hash) \
             FROM hits \
             WHERE hit_date >= CAST(?1 AS TIMESTAMP) AND hit_date < CAST(?2 AS TIMESTAMP) \
             GROUP BY {column} \
             ORDER BY COUNT(*) DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(duckdb::params![ts_start, ts_end], |row| {
                Ok(BreakdownRow {
                    label: row.get(0)?,
                    hits: row.get::<_, i64>(1)? as u64,
                    visitors: row.get::<_, i64>(2)? as u64,
                })
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(rows)
    }
}

/// Sort a merged label map by hits descending and keep the first `limit`.
fn top_n(merged: HashMap<String, Counts>, limit: usize) -> Vec<(String, Counts)> {
    let mut rows: Vec<(String, Counts)> = merged.into_iter().collect();
    rows.sort_by(|a, b| b.1.hits.cmp(&a.1.hits).then_with(|| a.0.cmp(&b.0)));
    rows.truncate(limit);
    rows
}
