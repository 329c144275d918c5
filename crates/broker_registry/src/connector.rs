//! Broker transport abstraction
//!
//! Defines how connections are opened, supporting a real MQTT transport and a mock for testing.

use contracts::{BrokerConfig, BrokerConnection};

use crate::error::Result;

/// Broker transport factory
///
/// Abstracts connection opening so the registry works the same against the
/// real MQTT transport and the in-memory mock.
pub trait BrokerConnector: Send + Sync {
    /// Connection handle produced by this transport
    type Connection: BrokerConnection + Send + Sync + 'static;

    /// Open a connection to the broker described by `config`
    ///
    /// Must not block: transports that need a background event loop spawn it
    /// on the current tokio runtime.
    ///
    /// # Arguments
    /// * `config` - Broker declaration (endpoint + credentials)
    /// * `client_id` - Client identifier presented to the broker
    fn connect(&self, config: &BrokerConfig, client_id: &str) -> Result<Self::Connection>;
}

/// Generate a per-run client id (`emulator-` + 6 hex chars)
pub fn generate_client_id() -> String {
    format!("emulator-{:06x}", rand::random::<u32>() & 0x00ff_ffff)
}
