//! Error types for the replay tool.

use querycache_core::{CacheError, ConfigError};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid script step {index}: {reason}")]
    InvalidStep { index: usize, reason: String },
    #[error("Failed to initialize logging: {0}")]
    Telemetry(String),
    #[error("Failed to encode output: {0}")]
    Output(#[source] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_step_display() {
        let err = CliError::InvalidStep {
            index: 2,
            reason: "delete needs exactly one of `id` or `item`".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid script step 2: delete needs exactly one of `id` or `item`"
        );
    }

    #[test]
    fn test_config_error_is_transparent() {
        let err: CliError = ConfigError::UnknownBinding {
            name: "todos".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Unknown binding: todos");
    }
}
