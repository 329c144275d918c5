//! Broker contracts - endpoint identity and the transport connection trait
//!
//! The registry owns at most one `BrokerConnection` per `BrokerEndpoint`.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Broker endpoint, the registry key for connections
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BrokerEndpoint {
    pub host: String,
    pub port: u16,
}

impl BrokerEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for BrokerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Result of an idempotent connection create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A new transport connection was opened
    Created,
    /// A connection for this endpoint was already registered; nothing was opened
    AlreadyExists,
}

/// Incoming message callback: (endpoint, topic, payload)
///
/// Uses `Arc` so one handler can be shared by every connection.
pub type MessageHandler = Arc<dyn Fn(&BrokerEndpoint, &str, &[u8]) + Send + Sync>;

/// Live channel to one broker
///
/// Implementations must accept concurrent calls through `&self`; the registry
/// hands the same connection to every timer that fires on its endpoint.
#[trait_variant::make(BrokerConnection: Send)]
pub trait LocalBrokerConnection {
    /// Endpoint this connection talks to
    fn endpoint(&self) -> &BrokerEndpoint;

    /// Publish a payload to a topic
    ///
    /// # Errors
    /// Returns transport error (should include endpoint and topic)
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), ContractError>;

    /// Subscribe to a topic; incoming messages go to the connector's `MessageHandler`
    async fn subscribe(&self, topic: &str) -> Result<(), ContractError>;

    /// Unsubscribe from a topic
    async fn unsubscribe(&self, topic: &str) -> Result<(), ContractError>;

    /// Close the connection
    async fn close(&self) -> Result<(), ContractError>;
}
