//! Broker Registry error types

use contracts::{BrokerEndpoint, ContractError};
use thiserror::Error;

/// Broker Registry specific error
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Transport could not be opened
    #[error("failed to connect to broker {endpoint}: {message}")]
    ConnectionFailed {
        endpoint: BrokerEndpoint,
        message: String,
    },

    /// Transport operation failed on a registered connection
    #[error("broker transport error: {0}")]
    Transport(#[from] ContractError),
}

impl BrokerError {
    /// Create connection error
    pub fn connection_failed(endpoint: &BrokerEndpoint, message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            endpoint: endpoint.clone(),
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, BrokerError>;
