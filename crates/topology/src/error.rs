//! Topology error types

use contracts::EntityKey;
use thiserror::Error;

/// Topology resolution error (always fatal for the run)
#[derive(Debug, Error)]
pub enum TopologyError {
    /// Two selected declarations resolve to the same entity key
    #[error("duplicate entity key: {} {key}", .key.kind())]
    DuplicateEntityKey { key: EntityKey },
}

/// Topology Result type alias
pub type Result<T> = std::result::Result<T, TopologyError>;
