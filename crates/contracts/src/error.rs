//! Layered error definitions
//!
//! Categorized by source: config / topology / broker / control

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Topology Errors =====
    /// Two entities resolve to the same key
    #[error("duplicate entity key '{key}'")]
    DuplicateEntityKey { key: String },

    // ===== Broker Errors =====
    /// Broker connection error
    #[error("broker connection error at {endpoint}: {message}")]
    BrokerConnection { endpoint: String, message: String },

    /// Broker publish/subscribe error
    #[error("broker operation on {endpoint} topic '{topic}' failed: {message}")]
    BrokerOperation {
        endpoint: String,
        topic: String,
        message: String,
    },

    // ===== Control Channel Errors =====
    /// Control side-channel error
    #[error("control channel error: {message}")]
    ControlChannel { message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create broker connection error
    pub fn broker_connection(endpoint: impl ToString, message: impl Into<String>) -> Self {
        Self::BrokerConnection {
            endpoint: endpoint.to_string(),
            message: message.into(),
        }
    }

    /// Create broker publish/subscribe error
    pub fn broker_operation(
        endpoint: impl ToString,
        topic: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::BrokerOperation {
            endpoint: endpoint.to_string(),
            topic: topic.into(),
            message: message.into(),
        }
    }
}
