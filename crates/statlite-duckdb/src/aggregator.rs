//! The batch aggregation run: drain raw hits, merge into daily rollups,
//! prune the event store on full success.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{error, info};

use statlite_core::store::AggregationOutcome;

use crate::DuckDbBackend;

/// One raw hit as drained for aggregation — only the grouping columns.
struct RawHit {
    visitor_hash: String,
    page_path: String,
    referrer: Option<String>,
    stat_date: String,
}

/// Per-bucket accumulator: hit count plus the distinct visitor set, so the
/// run's own unique count is exact.
#[derive(Default)]
struct Bucket {
    hit_count: i64,
    visitors: HashSet<String>,
}

/// A persisted daily rollup row. Exposed for tests and operational tooling.
#[derive(Debug, Clone)]
pub struct DailyStatRow {
    pub stat_date: NaiveDate,
    pub page_path: String,
    pub referrer: Option<String>,
    pub hit_count: i64,
    pub unique_visitors: i64,
}

impl DuckDbBackend {
    /// Run one aggregation cycle.
    ///
    /// The whole run executes under the connection mutex, so no tracker
    /// insert can land between the drain and the prune from within this
    /// process. A second process writing the same database file would still
    /// hit the original design's drain/delete-all window: the prune deletes
    /// every row in `hits`, not just the rows this run read. The scheduler
    /// must also guarantee non-overlapping runs.
    ///
    /// Merge semantics per identity (stat_date, page_path, referrer):
    /// `hit_count += bucket.hit_count` and
    /// `unique_visitors = greatest(existing, bucket)` — max, not set union,
    /// so uniques are undercounted across runs. Kept deliberately; a sketch
    /// (HyperLogLog) per identity would be the correctness-preserving
    /// alternative.
    ///
    /// Any single merge failure fails the run and skips the prune; the raw
    /// hits are retried by the next scheduled run (at-least-once, and
    /// buckets merged before the failure will be double-counted on retry).
    pub async fn aggregate_hits(&self) -> Result<AggregationOutcome> {
        let conn = self.conn.lock().await;

        // Drain: read every pending raw hit.
        let raw: Vec<RawHit> = conn
            .prepare(
                "SELECT visitor_hash, page_path, referrer, strftime(hit_date, '%Y-%m-%d') \
                 FROM hits",
            )?
            .query_map([], |row| {
                Ok(RawHit {
                    visitor_hash: row.get(0)?,
                    page_path: row.get(1)?,
                    referrer: row.get(2)?,
                    stat_date: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<_, _>>()?;

        if raw.is_empty() {
            return Ok(AggregationOutcome::default());
        }
        let hits_processed = raw.len();

        // Group by (date, page, referrer); NULL referrer is its own bucket.
        let mut buckets: HashMap<(String, String, Option<String>), Bucket> = HashMap::new();
        for hit in raw {
            let bucket = buckets
                .entry((hit.stat_date, hit.page_path, hit.referrer))
                .or_default();
            bucket.hit_count += 1;
            bucket.visitors.insert(hit.visitor_hash);
        }
        let buckets_merged = buckets.len();

        // Merge-upsert each bucket. A failed bucket does not stop the loop;
        // it marks the whole run failed so the prune is skipped.
        let mut merge_failed = false;
        for ((stat_date, page_path, referrer), bucket) in buckets {
            let unique_visitors = bucket.visitors.len() as i64;
            if let Err(e) = merge_bucket(
                &conn,
                &stat_date,
                &page_path,
                referrer.as_deref(),
                bucket.hit_count,
                unique_visitors,
            ) {
                merge_failed = true;
                error!(
                    %stat_date,
                    %page_path,
                    error = %e,
                    "Failed to merge aggregation bucket"
                );
            }
        }

        if merge_failed {
            anyhow::bail!("aggregation run failed; raw hits retained for retry");
        }

        // Prune: bulk-delete the event store, only after every merge landed.
        conn.execute("DELETE FROM hits", [])?;

        info!(hits_processed, buckets_merged, "Aggregation run complete");
        Ok(AggregationOutcome {
            hits_processed,
            buckets_merged,
        })
    }

    /// Look up one rollup row by its identity. `None` if absent.
    pub async fn get_daily_stat(
        &self,
        stat_date: NaiveDate,
        page_path: &str,
        referrer: Option<&str>,
    ) -> Result<Option<DailyStatRow>> {
        let conn = self.conn.lock().await;
        let date_str = stat_date.format("%Y-%m-%d").to_string();
        let result = conn
            .prepare(
                "SELECT strftime(stat_date, '%Y-%m-%d'), page_path, referrer, hit_count, unique_visitors \
                 FROM daily_stats \
                 WHERE stat_date = CAST(?1 AS DATE) AND page_path = ?2 \
                   AND (referrer = ?3 OR (referrer IS NULL AND ?3 IS NULL))",
            )?
            .query_row(duckdb::params![date_str, page_path, referrer], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            });
        match result {
            Ok((date_text, page_path, referrer, hit_count, unique_visitors)) => {
                let stat_date = NaiveDate::parse_from_str(&date_text, "%Y-%m-%d")?;
                Ok(Some(DailyStatRow {
                    stat_date,
                    page_path,
                    referrer,
                    hit_count,
                    unique_visitors,
                }))
            }
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Upsert one bucket into `daily_stats` under the merge rule.
fn merge_bucket(
    conn: &duckdb::Connection,
    stat_date: &str,
    page_path: &str,
    referrer: Option<&str>,
    hit_count: i64,
    unique_visitors: i64,
) -> Result<()> {
    let existing: Option<String> = match conn
        .prepare(
            "SELECT id FROM daily_stats \
             WHERE stat_date = CAST(?1 AS DATE) AND page_path = ?2 \
               AND (referrer = ?3 OR (referrer IS NULL AND ?3 IS NULL))",
        )?
        .query_row(duckdb::params![stat_date, page_path, referrer], |row| {
            row.get(0)
        }) {
        Ok(id) => Some(id),
        Err(duckdb::Error::QueryReturnedNoRows) => None,
        Err(e) => return Err(e.into()),
    };

    match existing {
        Some(id) => {
            conn.execute(
                "UPDATE daily_stats \
                 SET hit_count = hit_count + ?1, \
                     unique_visitors = greatest(unique_visitors, ?2) \
                 WHERE id = ?3",
                duckdb::params![hit_count, unique_visitors, id],
            )?;
        }
        None => {
            conn.execute(
                "INSERT INTO daily_stats (id, stat_date, page_path, referrer, hit_count, unique_visitors) \
                 VALUES (?1, CAST(?2 AS DATE), ?3, ?4, ?5, ?6)",
                duckdb::params![
                    uuid::Uuid::new_v4().to_string(),
                    stat_date,
                    page_path,
                    referrer,
                    hit_count,
                    unique_visitors
                ],
            )?;
        }
    }
    Ok(())
}
