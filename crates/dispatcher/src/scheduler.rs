//! DispatchScheduler - one timer task per event
//!
//! Every event gets its own task that sleeps until `start + offset / speed`
//! and then publishes. Tasks never wait on each other, so a slow broker
//! only delays its own publishes.

use std::sync::Arc;
use std::time::Duration;

use broker_registry::{BrokerConnector, BrokerRegistry, RouteOutcome};
use contracts::{BrokerEndpoint, Entity, EntityKey, EntityKind, EventIndex, StreamEvent};
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use topology::Topology;
use tracing::{debug, error, info, instrument, warn};

use crate::error::DispatcherError;
use crate::handle::ScheduleHandle;
use crate::metrics::DispatchMetrics;
use crate::payload::{build_payload, encode_payload, fire_timestamp};

/// Lowest accepted replay speed
pub const MIN_SPEED: f64 = 0.1;

/// Terminal state of one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// Accepted by the broker connection
    Delivered,
    /// No connection for the entity's endpoint
    Dropped,
    /// Encoding or transport failure
    Failed,
}

/// Result of one fired timer
#[derive(Debug, Clone)]
pub struct FireReport {
    pub key: EntityKey,
    pub relative_time: u64,
    pub outcome: FireOutcome,
    /// How far past its target instant the timer woke
    pub lateness: Duration,
}

/// Where an entity's events go
#[derive(Debug)]
struct Route {
    key: EntityKey,
    label: String,
    kind: EntityKind,
    endpoint: BrokerEndpoint,
    topic: String,
}

impl Route {
    fn for_entity(entity: &Entity) -> Self {
        Self {
            label: entity.key.to_string(),
            kind: entity.kind(),
            endpoint: entity.endpoint.clone(),
            topic: entity.key.topic(),
            key: entity.key.clone(),
        }
    }
}

/// Timed dispatch scheduler
pub struct DispatchScheduler<C: BrokerConnector> {
    registry: Arc<BrokerRegistry<C>>,
    speed: f64,
    metrics: Arc<DispatchMetrics>,
}

impl<C: BrokerConnector + 'static> DispatchScheduler<C> {
    /// Create a scheduler over a fully set-up registry
    pub fn new(registry: Arc<BrokerRegistry<C>>) -> Self {
        Self {
            registry,
            speed: 1.0,
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }

    /// Set replay speed (clamped to `MIN_SPEED`)
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = clamp_speed(speed);
        self
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    /// Delay from run start for a relative offset in milliseconds
    pub fn fire_delay(&self, relative_ms: u64) -> Duration {
        Duration::from_secs_f64(relative_ms as f64 / 1000.0 / self.speed)
    }

    /// Arm one timer per event of every entity in `topology`
    ///
    /// The run starts now. Must be called inside a tokio runtime. Entities
    /// missing from `events` are skipped with a warning.
    #[instrument(
        name = "dispatch_scheduler_arm",
        skip(self, topology, events),
        fields(entities = topology.len(), speed = self.speed)
    )]
    pub fn arm(&self, topology: &Topology, events: &EventIndex) -> ScheduleHandle {
        let start = Instant::now();
        let mut tasks = JoinSet::new();
        let mut scheduled = 0;

        for entity in topology.entities() {
            let Some(entity_events) = events.get(&entity.key) else {
                warn!(entity = %entity.key, "entity has no event list, nothing scheduled");
                continue;
            };
            if entity_events.is_empty() {
                debug!(entity = %entity.key, "no events to schedule");
                continue;
            }

            let route = Arc::new(Route::for_entity(entity));
            for event in entity_events {
                let target = start + self.fire_delay(event.relative_time);
                tasks.spawn(fire_at(
                    target,
                    Arc::clone(&self.registry),
                    Arc::clone(&route),
                    event.clone(),
                    Arc::clone(&self.metrics),
                ));
                self.metrics.inc_scheduled();
                observability::record_event_scheduled();
                scheduled += 1;
            }
        }

        info!(scheduled, "events armed");
        ScheduleHandle::new(tasks, scheduled, Arc::clone(&self.metrics))
    }
}

fn clamp_speed(speed: f64) -> f64 {
    if speed.is_finite() {
        speed.max(MIN_SPEED)
    } else {
        1.0
    }
}

/// Timer task body
async fn fire_at<C: BrokerConnector>(
    target: Instant,
    registry: Arc<BrokerRegistry<C>>,
    route: Arc<Route>,
    event: StreamEvent,
    metrics: Arc<DispatchMetrics>,
) -> FireReport {
    sleep_until(target).await;

    let lateness = Instant::now().saturating_duration_since(target);
    observability::record_fire_lateness_ms(lateness.as_secs_f64() * 1000.0);

    let outcome = match fire(&registry, &route, &event).await {
        Ok(RouteOutcome::Delivered) => {
            metrics.inc_fired();
            observability::record_event_fired(route.kind.as_str());
            FireOutcome::Delivered
        }
        Ok(RouteOutcome::UnknownEndpoint) => {
            metrics.inc_dropped();
            observability::record_event_dropped("unknown_broker");
            FireOutcome::Dropped
        }
        Err(e) => {
            error!(
                entity = %route.label,
                topic = %route.topic,
                relative_time = event.relative_time,
                error = %e,
                "event publish failed"
            );
            metrics.inc_failed();
            observability::record_event_dropped("publish_failed");
            FireOutcome::Failed
        }
    };

    FireReport {
        key: route.key.clone(),
        relative_time: event.relative_time,
        outcome,
        lateness,
    }
}

async fn fire<C: BrokerConnector>(
    registry: &BrokerRegistry<C>,
    route: &Route,
    event: &StreamEvent,
) -> Result<RouteOutcome, DispatcherError> {
    let payload = build_payload(route.kind, event, fire_timestamp());
    let bytes = encode_payload(&route.label, &payload)?;
    Ok(registry.publish(&route.endpoint, &route.topic, bytes).await?)
}
