use std::sync::Arc;

use anyhow::Result;
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::info;

use statlite_core::hit::Hit;

use crate::schema::init_sql;

/// The DuckDB storage backend for Statlite.
///
/// DuckDB is single-writer: concurrent reads are fine, but concurrent writes
/// cause contention. The connection is wrapped in `Arc<Mutex<_>>` so the
/// async runtime serializes all statement execution while the struct stays
/// cheap to clone and share across Axum handlers. That same serialization is
/// what makes the heatmap upsert and the aggregation run safe against
/// tracker inserts racing from within the process.
pub struct DuckDbBackend {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl DuckDbBackend {
    /// Open (or create) a DuckDB database file at `path`.
    ///
    /// `memory_limit` is a DuckDB size string such as `"512MB"`, read from
    /// `Config.duckdb_memory_limit` at the call site.
    pub fn open(path: &str, memory_limit: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(&init_sql(memory_limit))?;
        info!(
            "DuckDB opened at {} with memory_limit={}, threads=2",
            path, memory_limit
        );
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an **in-memory** DuckDB database.
    ///
    /// Intended for tests — data is discarded when the struct is dropped.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql("1GB"))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Cheap liveness probe for the health endpoint.
    pub async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.prepare("SELECT 1")?
            .query_row([], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Append raw hits to the event store.
    ///
    /// The batch runs in a single transaction for atomicity and throughput
    /// (one fsync instead of N).
    pub async fn insert_hits(&self, hits: &[Hit]) -> Result<()> {
        if hits.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        for hit in hits {
            tx.execute(
                "INSERT INTO hits (
                    visitor_hash, page_path, referrer, user_agent_hash,
                    device_type, os, hit_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                duckdb::params![
                    hit.visitor_hash,
                    hit.page_path,
                    hit.referrer,
                    hit.user_agent_hash,
                    hit.device_type.as_str(),
                    hit.os.as_str(),
                    hit.hit_date.to_rfc3339(),
                ],
            )?;
        }
        tx.commit()?;
        tracing::debug!(count = hits.len(), "Inserted hits into DuckDB");
        Ok(())
    }

    /// Number of raw hits awaiting aggregation.
    pub async fn pending_hit_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .prepare("SELECT COUNT(*) FROM hits")?
            .query_row([], |row| row.get(0))?;
        Ok(count)
    }
}
