/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// All statements use `IF NOT EXISTS` so they are safe to re-run on every
/// startup (idempotent).
///
/// `memory_limit` is a DuckDB size string ("512MB", "1GB", ...). Always set
/// an explicit limit — the DuckDB default of 80% of system RAM is not
/// acceptable for a server process. `threads = 2` bounds the background
/// thread pool for single-writer embedded use.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

-- ===========================================
-- HITS (raw event store)
-- ===========================================
-- Append-only. No row identity: rows are only ever read in bulk by the
-- aggregator and bulk-deleted after a successful run.
CREATE TABLE IF NOT EXISTS hits (
    visitor_hash    VARCHAR NOT NULL,      -- hex HMAC-SHA256, rotates daily
    page_path       VARCHAR NOT NULL,      -- <= 255 bytes, truncated by the tracker
    referrer        VARCHAR,               -- normalized source label; NULL = direct
    user_agent_hash VARCHAR NOT NULL,      -- hex SHA-256, unsalted
    device_type     VARCHAR NOT NULL,      -- 'Desktop' | 'Mobile' | 'Tablet'
    os              VARCHAR NOT NULL,      -- 'iOS' | 'Android' | 'Windows' | 'MacOS' | 'Linux' | 'Other'
    hit_date        TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_hits_date ON hits(hit_date);

-- ===========================================
-- DAILY_STATS (durable rollups)
-- ===========================================
-- Row identity is (stat_date, page_path, referrer), with NULL referrer a
-- distinct identity. Written only by the aggregator's merge-upsert; the
-- identity lookup handles NULL explicitly, so no unique constraint is
-- declared (DuckDB treats NULLs as distinct in unique indexes).
CREATE TABLE IF NOT EXISTS daily_stats (
    id              VARCHAR PRIMARY KEY,   -- UUID v4
    stat_date       DATE NOT NULL,
    page_path       VARCHAR NOT NULL,
    referrer        VARCHAR,               -- NULL = direct
    hit_count       BIGINT NOT NULL DEFAULT 0,
    unique_visitors BIGINT NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_daily_stats_identity
    ON daily_stats(stat_date, page_path, referrer);
CREATE INDEX IF NOT EXISTS idx_daily_stats_date ON daily_stats(stat_date);
CREATE INDEX IF NOT EXISTS idx_daily_stats_page ON daily_stats(page_path);

-- ===========================================
-- HEATMAP_CELLS (click accumulator)
-- ===========================================
-- The primary key drives the ON CONFLICT upsert in heatmap.rs. Never pruned.
CREATE TABLE IF NOT EXISTS heatmap_cells (
    page_path       VARCHAR NOT NULL,
    viewport_type   VARCHAR NOT NULL,      -- 'mobile' | 'tablet' | 'desktop'
    x_grid          INTEGER NOT NULL,      -- 0..=100, percentage of page width
    y_grid          INTEGER NOT NULL,      -- 20px vertical bucket index
    click_count     BIGINT NOT NULL DEFAULT 1,
    PRIMARY KEY (page_path, viewport_type, x_grid, y_grid)
);
"#
    )
}
