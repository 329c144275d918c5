//! MQTT transport (rumqttc)
//!
//! Each connection owns an `AsyncClient` plus a spawned task driving its
//! event loop. The loop reconnects on its own; errors are logged and retried
//! after a short pause.
//!
//! Requests never wait for room in the client queue. While a broker is
//! unreachable the queue fills up and further publishes fail at once, so a
//! timer is never parked on a dead endpoint.
//!
//! The protocol is 3.1.1, which has no no-local subscription option: a
//! subscription on a topic this same connection publishes to receives those
//! messages back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bytes::Bytes;
use contracts::{BrokerConfig, BrokerConnection, BrokerEndpoint, ContractError, MessageHandler};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::connector::BrokerConnector;
use crate::error::{BrokerError, Result};

const KEEP_ALIVE: Duration = Duration::from_secs(30);
const REQUEST_CAPACITY: usize = 64;
const RETRY_PAUSE: Duration = Duration::from_secs(1);

/// MQTT 3.1.1 transport factory
#[derive(Clone, Default)]
pub struct MqttConnector {
    handler: Option<MessageHandler>,
}

impl MqttConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward incoming publishes on subscribed topics to `handler`
    pub fn with_handler(mut self, handler: MessageHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    fn options(config: &BrokerConfig, client_id: &str) -> MqttOptions {
        let mut options = MqttOptions::new(client_id, config.host.clone(), config.port);
        options.set_keep_alive(KEEP_ALIVE);
        options.set_clean_session(true);
        if !config.user.is_empty() {
            options.set_credentials(config.user.clone(), config.password.clone());
        }
        options
    }
}

impl BrokerConnector for MqttConnector {
    type Connection = MqttConnection;

    #[instrument(
        name = "mqtt_connect",
        skip(self, config),
        fields(host = %config.host, port = config.port)
    )]
    fn connect(&self, config: &BrokerConfig, client_id: &str) -> Result<MqttConnection> {
        let endpoint = config.endpoint();

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            BrokerError::connection_failed(&endpoint, format!("no tokio runtime: {e}"))
        })?;

        let (client, event_loop) =
            AsyncClient::new(Self::options(config, client_id), REQUEST_CAPACITY);

        let task = runtime.spawn(drive_event_loop(
            endpoint.clone(),
            event_loop,
            self.handler.clone(),
        ));

        info!(endpoint = %endpoint, client_id, "MQTT client started");

        Ok(MqttConnection {
            endpoint,
            client,
            task,
            closed: AtomicBool::new(false),
        })
    }
}

/// Poll the event loop until the connection is closed
async fn drive_event_loop(
    endpoint: BrokerEndpoint,
    mut event_loop: EventLoop,
    handler: Option<MessageHandler>,
) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                info!(endpoint = %endpoint, code = ?ack.code, "connected to broker");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                debug!(endpoint = %endpoint, topic = %publish.topic, "message received");
                if let Some(handler) = &handler {
                    handler(&endpoint, &publish.topic, &publish.payload);
                }
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                warn!(endpoint = %endpoint, "broker sent disconnect");
            }
            Ok(Event::Outgoing(rumqttc::Outgoing::Disconnect)) => {
                debug!(endpoint = %endpoint, "disconnect sent");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                error!(endpoint = %endpoint, error = %e, "MQTT connection error");
                tokio::time::sleep(RETRY_PAUSE).await;
            }
        }
    }
}

/// Live MQTT connection
pub struct MqttConnection {
    endpoint: BrokerEndpoint,
    client: AsyncClient,
    task: JoinHandle<()>,
    closed: AtomicBool,
}

impl MqttConnection {
    fn op_error(&self, topic: &str, e: impl std::fmt::Display) -> ContractError {
        ContractError::broker_operation(&self.endpoint, topic, e.to_string())
    }
}

impl BrokerConnection for MqttConnection {
    fn endpoint(&self) -> &BrokerEndpoint {
        &self.endpoint
    }

    async fn publish(&self, topic: &str, payload: Bytes) -> std::result::Result<(), ContractError> {
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload.to_vec())
            .map_err(|e| self.op_error(topic, e))
    }

    async fn subscribe(&self, topic: &str) -> std::result::Result<(), ContractError> {
        self.client
            .try_subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| self.op_error(topic, e))
    }

    async fn unsubscribe(&self, topic: &str) -> std::result::Result<(), ContractError> {
        self.client
            .try_unsubscribe(topic)
            .map_err(|e| self.op_error(topic, e))
    }

    async fn close(&self) -> std::result::Result<(), ContractError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        if let Err(e) = self.client.try_disconnect() {
            // Queue full or event loop gone; still tear the task down
            warn!(endpoint = %self.endpoint, error = %e, "disconnect request failed");
        }
        self.task.abort();
        Ok(())
    }
}

impl Drop for MqttConnection {
    fn drop(&mut self) {
        self.task.abort();
    }
}
