use std::time::Duration;

use crate::error::ConfigError;

/// Process configuration, loaded once at startup from `STATLITE_*`
/// environment variables and passed down explicitly — no global state.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    /// Canonical site host; referrers from this host or its subdomains are
    /// treated as internal navigation.
    pub site_host: String,
    pub aggregate_interval_secs: u64,
    /// Upper bound on cells returned by the heatmap read endpoint.
    pub heatmap_max_cells: usize,
    pub duckdb_memory_limit: String,
    /// Allowed CORS origins; empty means any.
    pub cors_origins: Vec<String>,
    /// Path prefixes that are never tracked (admin surfaces).
    pub excluded_paths: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            port: parse_var("STATLITE_PORT", 3000)?,
            data_dir: std::env::var("STATLITE_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            site_host: std::env::var("STATLITE_SITE_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            aggregate_interval_secs: parse_var("STATLITE_AGGREGATE_INTERVAL_SECS", 3600)?,
            heatmap_max_cells: parse_var("STATLITE_HEATMAP_MAX_CELLS", 2000)?,
            duckdb_memory_limit: std::env::var("STATLITE_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "512MB".to_string()),
            cors_origins: list_var("STATLITE_CORS_ORIGINS"),
            excluded_paths: {
                let paths = list_var("STATLITE_EXCLUDED_PATHS");
                if paths.is_empty() {
                    vec!["/admin".to_string()]
                } else {
                    paths
                }
            },
        })
    }

    pub fn aggregate_interval(&self) -> Duration {
        Duration::from_secs(self.aggregate_interval_secs)
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid { name, raw }),
        Err(_) => Ok(default),
    }
}

fn list_var(name: &str) -> Vec<String> {
    std::env::var(name)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
