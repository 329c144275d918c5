//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Payload could not be serialized
    #[error("failed to encode payload for {entity}: {source}")]
    PayloadEncoding {
        entity: String,
        #[source]
        source: serde_json::Error,
    },

    /// Publish failed on a registered connection
    #[error("publish failed: {0}")]
    Broker(#[from] broker_registry::BrokerError),
}
