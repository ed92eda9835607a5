use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use statlite_server::state::AppState;

/// `statlite health` — liveness probe for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$STATLITE_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("STATLITE_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Health-check subcommand, handled before tokio does any real work so
    // the probe stays cheap.
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }

    // Structured JSON logging. Level controlled via RUST_LOG env var.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("statlite=info".parse()?),
        )
        .json()
        .init();

    let cfg = statlite_core::config::Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Ensure data directory exists before opening DuckDB.
    std::fs::create_dir_all(&cfg.data_dir)?;
    let db_path = format!("{}/statlite.db", cfg.data_dir);
    let db = statlite_duckdb::DuckDbBackend::open(&db_path, &cfg.duckdb_memory_limit)?;

    let state = Arc::new(AppState::new(db, cfg.clone()));

    // Spawn the background aggregation loop.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            statlite_server::scheduler::run_scheduler_loop(state).await;
        });
    }

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = statlite_server::app::build_app(Arc::clone(&state));

    info!(port = cfg.port, "Statlite listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let state_for_shutdown = Arc::clone(&state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        tokio::signal::ctrl_c().await.ok();
    })
    .await?;

    // Fold whatever raw hits arrived since the last tick before exiting.
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        if let Err(e) = state_for_shutdown.db.aggregate_hits().await {
            tracing::warn!(error = %e, "Final aggregation on shutdown failed");
        }
    })
    .await
    .ok();

    Ok(())
}
