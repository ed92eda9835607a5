use std::sync::Arc;

use tracing::{error, info};

use crate::state::AppState;

/// Run one aggregation pass: fold pending raw hits into `daily_stats`.
///
/// On failure the raw hits are retained and the next tick retries.
pub async fn process_once(state: &Arc<AppState>) -> anyhow::Result<()> {
    let outcome = state.db.aggregate_hits().await?;
    if outcome.hits_processed > 0 {
        info!(
            hits = outcome.hits_processed,
            buckets = outcome.buckets_merged,
            "Aggregation run complete"
        );
    }
    Ok(())
}

/// Background loop driving the aggregator on the configured interval.
///
/// A late tick (the previous run overran, or the process was suspended)
/// delays rather than bursts, so runs never overlap.
pub async fn run_scheduler_loop(state: Arc<AppState>) {
    let interval = state.config.aggregate_interval();
    info!(interval_secs = interval.as_secs(), "Aggregation scheduler started");
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick fires immediately; skip it so startup is not an
    // aggregation run.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if let Err(err) = process_once(&state).await {
            error!(error = %err, "Aggregation run failed — will retry next tick");
        }
    }
}
