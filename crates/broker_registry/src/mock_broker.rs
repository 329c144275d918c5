//! Mock broker transport
//!
//! In-memory transport for tests and dry runs; records every connection and
//! publish, and supports injected failures.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use bytes::Bytes;
use contracts::{
    BrokerConfig, BrokerConnection, BrokerEndpoint, ContractError, MessageHandler,
};
use tracing::{debug, instrument};

use crate::connector::BrokerConnector;
use crate::error::{BrokerError, Result};

/// Mock transport configuration
#[derive(Debug, Default, Clone)]
pub struct MockBrokerConfig {
    /// Endpoints whose connect should fail
    pub fail_connect: Vec<BrokerEndpoint>,
    /// Endpoints whose publishes should fail
    pub fail_publish: Vec<BrokerEndpoint>,
    /// Endpoints whose publishes are delayed
    pub publish_delay: HashMap<BrokerEndpoint, Duration>,
}

/// One recorded publish
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub endpoint: BrokerEndpoint,
    pub topic: String,
    pub payload: Bytes,
    /// When the transport accepted the message
    pub at: Instant,
}

impl PublishedMessage {
    pub fn payload_str(&self) -> &str {
        std::str::from_utf8(&self.payload).unwrap_or_default()
    }
}

#[derive(Default)]
struct MockState {
    /// (endpoint, client id) per opened transport connection
    connects: Vec<(BrokerEndpoint, String)>,
    published: Vec<PublishedMessage>,
    subscriptions: HashMap<BrokerEndpoint, HashSet<String>>,
    closed: Vec<BrokerEndpoint>,
}

/// Mock broker transport
///
/// Clones share the same recorded state, so a test can keep one clone for
/// assertions and hand the other to a `BrokerRegistry`.
#[derive(Clone, Default)]
pub struct MockBroker {
    config: MockBrokerConfig,
    state: Arc<Mutex<MockState>>,
    handler: Option<MessageHandler>,
}

impl MockBroker {
    /// Create default mock transport
    pub fn new() -> Self {
        Self::with_config(MockBrokerConfig::default())
    }

    /// Create mock transport with injected failures
    pub fn with_config(config: MockBrokerConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(MockState::default())),
            handler: None,
        }
    }

    /// Route subscribed messages injected via `deliver` to `handler`
    pub fn with_handler(mut self, handler: MessageHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Number of transport connections opened for an endpoint
    pub fn connect_count(&self, endpoint: &BrokerEndpoint) -> usize {
        self.state
            .lock()
            .unwrap()
            .connects
            .iter()
            .filter(|(e, _)| e == endpoint)
            .count()
    }

    /// Client ids used so far, in connect order
    pub fn client_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .connects
            .iter()
            .map(|(_, id)| id.clone())
            .collect()
    }

    /// All published messages, in transport acceptance order
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.state.lock().unwrap().published.clone()
    }

    /// Published messages for one topic
    pub fn published_to(&self, topic: &str) -> Vec<PublishedMessage> {
        self.state
            .lock()
            .unwrap()
            .published
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    /// Topics currently subscribed on an endpoint
    pub fn subscriptions(&self, endpoint: &BrokerEndpoint) -> HashSet<String> {
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .get(endpoint)
            .cloned()
            .unwrap_or_default()
    }

    /// Endpoints whose connection was closed
    pub fn closed(&self) -> Vec<BrokerEndpoint> {
        self.state.lock().unwrap().closed.clone()
    }

    /// Simulate an incoming message; reaches the handler only if subscribed
    ///
    /// Returns whether the handler was invoked.
    pub fn deliver(&self, endpoint: &BrokerEndpoint, topic: &str, payload: &[u8]) -> bool {
        let subscribed = self
            .state
            .lock()
            .unwrap()
            .subscriptions
            .get(endpoint)
            .is_some_and(|topics| topics.contains(topic));

        match (&self.handler, subscribed) {
            (Some(handler), true) => {
                handler(endpoint, topic, payload);
                true
            }
            _ => false,
        }
    }
}

impl BrokerConnector for MockBroker {
    type Connection = MockConnection;

    #[instrument(
        name = "mock_broker_connect",
        skip(self, config),
        fields(host = %config.host, port = config.port)
    )]
    fn connect(&self, config: &BrokerConfig, client_id: &str) -> Result<MockConnection> {
        let endpoint = config.endpoint();

        if self.config.fail_connect.contains(&endpoint) {
            return Err(BrokerError::connection_failed(&endpoint, "mock failure"));
        }

        self.state
            .lock()
            .unwrap()
            .connects
            .push((endpoint.clone(), client_id.to_string()));

        Ok(MockConnection {
            fail_publish: self.config.fail_publish.contains(&endpoint),
            publish_delay: self.config.publish_delay.get(&endpoint).copied(),
            endpoint,
            state: Arc::clone(&self.state),
            closed: AtomicBool::new(false),
        })
    }
}

/// Mock connection handle
pub struct MockConnection {
    endpoint: BrokerEndpoint,
    state: Arc<Mutex<MockState>>,
    fail_publish: bool,
    publish_delay: Option<Duration>,
    closed: AtomicBool,
}

impl MockConnection {
    fn ensure_open(&self, topic: &str) -> std::result::Result<(), ContractError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(ContractError::broker_operation(
                &self.endpoint,
                topic,
                "connection closed",
            ))
        } else {
            Ok(())
        }
    }
}

impl BrokerConnection for MockConnection {
    fn endpoint(&self) -> &BrokerEndpoint {
        &self.endpoint
    }

    async fn publish(&self, topic: &str, payload: Bytes) -> std::result::Result<(), ContractError> {
        self.ensure_open(topic)?;

        if let Some(delay) = self.publish_delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_publish {
            return Err(ContractError::broker_operation(
                &self.endpoint,
                topic,
                "mock failure",
            ));
        }

        self.state.lock().unwrap().published.push(PublishedMessage {
            endpoint: self.endpoint.clone(),
            topic: topic.to_string(),
            payload,
            at: Instant::now(),
        });
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> std::result::Result<(), ContractError> {
        self.ensure_open(topic)?;
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .entry(self.endpoint.clone())
            .or_default()
            .insert(topic.to_string());
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> std::result::Result<(), ContractError> {
        self.ensure_open(topic)?;
        if let Some(topics) = self
            .state
            .lock()
            .unwrap()
            .subscriptions
            .get_mut(&self.endpoint)
        {
            topics.remove(topic);
        }
        Ok(())
    }

    async fn close(&self) -> std::result::Result<(), ContractError> {
        // Idempotent: a second close is recorded once
        if !self.closed.swap(true, Ordering::SeqCst) {
            let mut state = self.state.lock().unwrap();
            state.subscriptions.remove(&self.endpoint);
            state.closed.push(self.endpoint.clone());
            debug!(endpoint = %self.endpoint, "mock connection closed");
        }
        Ok(())
    }
}
