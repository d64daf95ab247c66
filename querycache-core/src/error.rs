//! Error types for QueryCache operations

use thiserror::Error;

/// Errors raised while computing a new snapshot for one key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MutationError {
    #[error("Page metadata missing from paginated envelope")]
    MissingPage,

    #[error("Invalid page field {field}: {reason}")]
    InvalidPageField { field: String, reason: String },

    #[error("Invalid page size {size}: must be greater than 0")]
    InvalidPageSize { size: i64 },

    #[error("Merge patch must be an object, got {found}")]
    PatchNotObject { found: &'static str },

    #[error("Merge target must be an object, got {found}")]
    MergeTargetNotObject { found: &'static str },

    #[error("Page count {total_elements} cannot be adjusted by {delta}")]
    CountOverflow { total_elements: i64, delta: i64 },

    #[error("Mutation panicked: {message}")]
    Panicked { message: String },
}

/// Errors raised by a query store backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store backend failed for key {key}: {reason}")]
    Backend { key: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Unknown binding: {name}")]
    UnknownBinding { name: String },
}

/// Master error type for all QueryCache errors.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for QueryCache operations.
pub type CacheResult<T> = Result<T, CacheError>;

// =============================================================================
// TESTS
// =============================================================================
