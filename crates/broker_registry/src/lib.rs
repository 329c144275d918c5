//! # Broker Registry
//!
//! Publish/subscribe broker connection management.
//!
//! Responsibilities:
//! - Open at most one connection per (host, port)
//! - Route publish/subscribe/unsubscribe requests to the right connection
//! - Tear connections down on explicit close
//! - Provide Mock and real MQTT transports behind one `BrokerConnector` trait
//!
//! ## Feature Flags
//!
//! - `real-mqtt`: Enable the MQTT transport (requires rumqttc)

pub mod connector;
pub mod error;
pub mod mock_broker;
pub mod registry;

#[cfg(feature = "real-mqtt")]
pub mod mqtt;

pub use connector::{generate_client_id, BrokerConnector};
pub use contracts::{BrokerConnection, BrokerEndpoint, CreateOutcome, MessageHandler};
pub use error::{BrokerError, Result};
pub use mock_broker::{MockBroker, MockBrokerConfig, MockConnection, PublishedMessage};
pub use registry::{BrokerRegistry, RouteOutcome};

#[cfg(feature = "real-mqtt")]
pub use mqtt::{MqttConnection, MqttConnector};
