//! Configuration error types.

use thiserror::Error;

/// Errors raised while loading or validating deployment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("REGION is required but was not provided")]
    MissingRegion,

    #[error("not a valid region identifier: {0}")]
    InvalidRegion(String),

    #[error("not a valid stack name (lowercase alphanumeric and dashes): {0}")]
    InvalidStackName(String),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
