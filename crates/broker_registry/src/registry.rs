//! BrokerRegistry core implementation
//!
//! One connection per (host, port), created idempotently during setup.
//! After setup the connection map is only read, so firing timers share the
//! registry behind an `Arc` without locking.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use contracts::{BrokerConfig, BrokerConnection, BrokerEndpoint, CreateOutcome};
use tracing::{debug, error, info, instrument, warn};

use crate::connector::{generate_client_id, BrokerConnector};
use crate::error::Result;

/// Routing result for operations addressed by endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Handed to the registered connection
    Delivered,
    /// No connection registered for the endpoint; nothing was sent
    UnknownEndpoint,
}

/// Broker connection registry
pub struct BrokerRegistry<C: BrokerConnector> {
    connector: C,
    connections: HashMap<BrokerEndpoint, Arc<C::Connection>>,
}

impl<C: BrokerConnector> BrokerRegistry<C> {
    /// Create an empty registry over a transport
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            connections: HashMap::new(),
        }
    }

    /// Open a connection unless one exists for the same (host, port)
    ///
    /// # Idempotence
    /// A second call for the same endpoint returns `AlreadyExists` and does
    /// not touch the transport, even if credentials or client id differ.
    #[instrument(
        name = "broker_registry_create_connection",
        skip(self, config),
        fields(host = %config.host, port = config.port)
    )]
    pub fn create_connection(
        &mut self,
        config: &BrokerConfig,
        client_id: &str,
    ) -> Result<CreateOutcome> {
        let endpoint = config.endpoint();

        if self.connections.contains_key(&endpoint) {
            debug!(endpoint = %endpoint, "connection already exists");
            return Ok(CreateOutcome::AlreadyExists);
        }

        let connection = self.connector.connect(config, client_id)?;
        self.connections.insert(endpoint.clone(), Arc::new(connection));

        debug!(endpoint = %endpoint, client_id, "connection created");
        Ok(CreateOutcome::Created)
    }

    /// Open connections for every broker declaration
    ///
    /// Each declaration gets a fresh client id. A broker that fails to
    /// connect is logged and skipped; events routed to it are dropped at
    /// fire time. Returns the number of connections created.
    #[instrument(
        name = "broker_registry_connect_all",
        skip(self, brokers),
        fields(broker_count = brokers.len())
    )]
    pub fn connect_all(&mut self, brokers: &[BrokerConfig]) -> usize {
        let mut created = 0;

        for broker in brokers {
            match self.create_connection(broker, &generate_client_id()) {
                Ok(CreateOutcome::Created) => created += 1,
                Ok(CreateOutcome::AlreadyExists) => {}
                Err(e) => {
                    error!(
                        endpoint = %broker.endpoint(),
                        error = %e,
                        "failed to connect broker, its events will be dropped"
                    );
                }
            }
        }

        info!(
            declared = brokers.len(),
            created,
            "broker connections set up"
        );
        created
    }

    /// Check whether an endpoint has a registered connection
    pub fn contains(&self, endpoint: &BrokerEndpoint) -> bool {
        self.connections.contains_key(endpoint)
    }

    /// Registered connection for an endpoint
    pub fn connection(&self, endpoint: &BrokerEndpoint) -> Option<&Arc<C::Connection>> {
        self.connections.get(endpoint)
    }

    /// Number of registered connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Registered endpoints
    pub fn endpoints(&self) -> impl Iterator<Item = &BrokerEndpoint> {
        self.connections.keys()
    }

    /// Publish through the connection registered for `endpoint`
    ///
    /// An unregistered endpoint is logged and reported as
    /// `UnknownEndpoint`; the message is not queued.
    ///
    /// # Errors
    /// Transport failure on a registered connection
    pub async fn publish(
        &self,
        endpoint: &BrokerEndpoint,
        topic: &str,
        payload: Bytes,
    ) -> Result<RouteOutcome> {
        let Some(connection) = self.lookup(endpoint, topic, "publish") else {
            return Ok(RouteOutcome::UnknownEndpoint);
        };

        debug!(endpoint = %endpoint, topic, bytes = payload.len(), "publishing");
        connection.publish(topic, payload).await?;
        Ok(RouteOutcome::Delivered)
    }

    /// Subscribe on the connection registered for `endpoint`
    pub async fn subscribe(&self, endpoint: &BrokerEndpoint, topic: &str) -> Result<RouteOutcome> {
        let Some(connection) = self.lookup(endpoint, topic, "subscribe") else {
            return Ok(RouteOutcome::UnknownEndpoint);
        };

        debug!(endpoint = %endpoint, topic, "subscribing");
        connection.subscribe(topic).await?;
        Ok(RouteOutcome::Delivered)
    }

    /// Unsubscribe on the connection registered for `endpoint`
    pub async fn unsubscribe(
        &self,
        endpoint: &BrokerEndpoint,
        topic: &str,
    ) -> Result<RouteOutcome> {
        let Some(connection) = self.lookup(endpoint, topic, "unsubscribe") else {
            return Ok(RouteOutcome::UnknownEndpoint);
        };

        debug!(endpoint = %endpoint, topic, "unsubscribing");
        connection.unsubscribe(topic).await?;
        Ok(RouteOutcome::Delivered)
    }

    /// Close and forget the connection for one endpoint
    ///
    /// Returns false if no connection was registered.
    #[instrument(name = "broker_registry_close_connection", skip(self), fields(endpoint = %endpoint))]
    pub async fn close_connection(&mut self, endpoint: &BrokerEndpoint) -> Result<bool> {
        let Some(connection) = self.connections.remove(endpoint) else {
            return Ok(false);
        };

        connection.close().await?;
        debug!(endpoint = %endpoint, "connection closed");
        Ok(true)
    }

    /// Close every connection (errors are logged, not returned)
    #[instrument(name = "broker_registry_close_all", skip(self), fields(count = self.connections.len()))]
    pub async fn close_all(&mut self) {
        for (endpoint, connection) in self.connections.drain() {
            if let Err(e) = connection.close().await {
                error!(endpoint = %endpoint, error = %e, "failed to close connection");
            }
        }
        info!("all broker connections closed");
    }

    fn lookup(
        &self,
        endpoint: &BrokerEndpoint,
        topic: &str,
        operation: &str,
    ) -> Option<&Arc<C::Connection>> {
        let connection = self.connections.get(endpoint);
        if connection.is_none() {
            warn!(
                endpoint = %endpoint,
                topic,
                operation,
                "specified broker is not defined"
            );
        }
        connection
    }
}
