//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration could not be loaded or failed validation
    #[error("Failed to load configuration: {0}")]
    Config(#[from] contracts::ContractError),

    /// Both `--instance` and `--process-type` given
    #[error("Cannot use --instance and --process-type together")]
    ConflictingSelection,

    /// Topology could not be resolved
    #[error("Failed to resolve topology: {0}")]
    Topology(#[from] topology::TopologyError),

    /// Generic error wrapper
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
