use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {raw:?}")]
    Invalid { name: &'static str, raw: String },
}
