//! Click-heatmap accumulator: atomic upsert-and-increment per grid cell.

use anyhow::Result;

use statlite_core::hit::{HeatmapCell, Viewport};

use crate::DuckDbBackend;

/// Upper bound on the x grid (percentage of page width).
const X_GRID_MAX: u32 = 100;

impl DuckDbBackend {
    /// Record one click in the (page, viewport, x, y) cell.
    ///
    /// The increment is a single SQL upsert, not a read-then-write, so
    /// concurrent clicks never lose updates. Out-of-range `x` is silently
    /// dropped — the beacon caller never reads the response, so there is
    /// nothing useful to surface.
    pub async fn record_click(
        &self,
        page_path: &str,
        viewport: Viewport,
        x: u32,
        y: u32,
    ) -> Result<()> {
        if x > X_GRID_MAX {
            tracing::debug!(page_path, x, "Dropping heatmap click with out-of-range x");
            return Ok(());
        }

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO heatmap_cells (page_path, viewport_type, x_grid, y_grid, click_count) \
             VALUES (?1, ?2, ?3, ?4, 1) \
             ON CONFLICT (page_path, viewport_type, x_grid, y_grid) \
             DO UPDATE SET click_count = click_count + 1",
            duckdb::params![page_path, viewport.as_str(), x, y],
        )?;
        Ok(())
    }

    /// Read the cells for one page and viewport, hottest first, at most
    /// `cap` rows (bounds the response payload).
    pub async fn heatmap_cells(
        &self,
        page_path: &str,
        viewport: Viewport,
        cap: usize,
    ) -> Result<Vec<HeatmapCell>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT x_grid, y_grid, click_count FROM heatmap_cells \
             WHERE page_path = ?1 AND viewport_type = ?2 \
             ORDER BY click_count DESC, y_grid ASC, x_grid ASC \
             LIMIT ?3",
        )?;
        let cells = stmt
            .query_map(
                duckdb::params![page_path, viewport.as_str(), cap as i64],
                |row| {
                    Ok(HeatmapCell {
                        x: row.get::<_, i64>(0)? as u32,
                        y: row.get::<_, i64>(1)? as u32,
                        count: row.get::<_, i64>(2)? as u64,
                    })
                },
            )?
            .collect::<std::result::Result<_, _>>()?;
        Ok(cells)
    }
}
