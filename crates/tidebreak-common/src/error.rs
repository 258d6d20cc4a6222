//! Error types shared across Tidebreak crates.

use thiserror::Error;

/// Top-level error type for Tidebreak operations.
#[derive(Debug, Error)]
pub enum TidebreakError {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be parsed
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// Config could not be serialized
    #[error("Failed to serialize config: {0}")]
    Serialize(String),
}

/// Result type alias for Tidebreak operations.
pub type TidebreakResult<T> = Result<T, TidebreakError>;
