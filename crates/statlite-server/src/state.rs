use std::sync::Arc;

use statlite_core::anonymizer::Anonymizer;
use statlite_core::cache::InMemoryTtlCache;
use statlite_core::config::Config;
use statlite_duckdb::DuckDbBackend;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
pub struct AppState {
    /// The DuckDB backend. Internally uses `Arc<tokio::sync::Mutex<Connection>>`
    /// so it is already cheap to clone and async-safe.
    pub db: Arc<DuckDbBackend>,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,

    /// Visitor fingerprinting with the rotating daily salt. The salt cache
    /// is in-process only; a restart simply regenerates the day's salt.
    pub anonymizer: Anonymizer,
}

impl AppState {
    /// Construct a new `AppState` wrapping the given backend and config.
    pub fn new(db: DuckDbBackend, config: Config) -> Self {
        Self {
            db: Arc::new(db),
            config: Arc::new(config),
            anonymizer: Anonymizer::new(Arc::new(InMemoryTtlCache::new())),
        }
    }
}
