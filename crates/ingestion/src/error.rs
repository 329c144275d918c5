//! Ingestion error types

use std::path::PathBuf;

use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Stream file could not be read
    #[error("failed to read stream file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stream file is not valid UTF-8
    #[error("stream file {} is not valid UTF-8", path.display())]
    InvalidEncoding { path: PathBuf },
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
