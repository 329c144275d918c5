//! Replay orchestrator - coordinates all components.
//!
//! Setup runs in sequence: resolve topology, announce instances, open
//! brokers, load streams, arm timers. Afterwards the registry is only read.
//!
//! Uses the MQTT transport when `real-mqtt` is enabled, otherwise the
//! in-memory mock transport.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use broker_registry::{BrokerConnector, BrokerRegistry};
use contracts::{ControlChannel, EmulatorBlueprint, EntityKind, EventIndex, Selection};
use dispatcher::DispatchScheduler;
use ingestion::LoadReport;
use topology::{Topology, TopologyResolver};
use tracing::{info, instrument, warn};

use super::control::{announce_instances, LogControlChannel};
use super::stats::{Completion, RunStats};
use crate::error::Result;

/// Replay configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Parsed configuration
    pub blueprint: EmulatorBlueprint,

    /// Process instance selection
    pub selection: Selection,

    /// Directory relative stream paths are resolved against
    pub base_dir: Option<PathBuf>,

    /// Replay speed multiplier
    pub speed: f64,

    /// Run timeout (None = wait for every event)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Resolved and loaded run, before any broker is contacted
pub struct ReplayPlan {
    pub topology: Topology,
    pub events: EventIndex,
    pub load_report: LoadReport,
}

/// Main replay orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Resolve the topology and load every stream
    ///
    /// # Errors
    /// Duplicate entity keys. Unreadable streams are not errors.
    #[instrument(name = "pipeline_plan", skip(self))]
    pub fn plan(&self) -> Result<ReplayPlan> {
        let topology = TopologyResolver::resolve(&self.config.blueprint, &self.config.selection)?;

        observability::record_entities(
            EntityKind::Stakeholder.as_str(),
            topology.stakeholders().count(),
        );
        observability::record_entities(EntityKind::Artifact.as_str(), topology.artifacts().count());

        let (events, load_report) =
            ingestion::load_event_index(topology.entities(), self.config.base_dir.as_deref());

        Ok(ReplayPlan {
            topology,
            events,
            load_report,
        })
    }

    /// Run the replay to completion over the default transport
    pub async fn run<F>(self, shutdown: F) -> Result<RunStats>
    where
        F: Future<Output = ()>,
    {
        #[cfg(feature = "real-mqtt")]
        return self
            .run_with(broker_registry::MqttConnector::new(), shutdown)
            .await;

        #[cfg(not(feature = "real-mqtt"))]
        {
            info!("Running with the in-memory transport (real-mqtt disabled)");
            self.run_with(broker_registry::MockBroker::new(), shutdown)
                .await
        }
    }

    /// Run the replay over a given transport
    ///
    /// Stops when every event has fired, the timeout elapses or `shutdown`
    /// resolves; pending timers are then cancelled and connections closed.
    pub async fn run_with<C, F>(self, connector: C, shutdown: F) -> Result<RunStats>
    where
        C: BrokerConnector + 'static,
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let plan = self.plan()?;
        let mut stats = RunStats {
            stakeholders: plan.topology.stakeholders().count(),
            artifacts: plan.topology.artifacts().count(),
            excluded_artifacts: plan.topology.excluded_artifacts().len(),
            streams_failed: plan.load_report.failed.len(),
            events_loaded: plan.load_report.events,
            lines_skipped: plan.load_report.skipped_lines,
            ..Default::default()
        };

        // Announce instances before anything is published
        let mut control = LogControlChannel::new("log");
        stats.instances_announced = announce_instances(&mut control, &plan.topology).await;
        if let Err(e) = control.close().await {
            warn!(error = %e, "failed to close control channel");
        }

        // Open broker connections
        let mut registry = BrokerRegistry::new(connector);
        stats.brokers_connected = registry.connect_all(&self.config.blueprint.brokers);
        let registry = Arc::new(registry);

        // Arm timers
        let scheduler =
            DispatchScheduler::new(Arc::clone(&registry)).with_speed(self.config.speed);
        let mut handle = scheduler.arm(&plan.topology, &plan.events);
        info!(
            scheduled = handle.scheduled(),
            speed = scheduler.speed(),
            "Replay started"
        );

        let timeout = async {
            match self.config.timeout {
                Some(t) => tokio::time::sleep(t).await,
                None => std::future::pending().await,
            }
        };

        stats.completion = tokio::select! {
            _ = handle.join() => Completion::AllFired,
            _ = timeout => {
                warn!("Timeout reached, cancelling pending events");
                Completion::Timeout
            }
            _ = shutdown => {
                warn!("Received shutdown signal, cancelling pending events");
                Completion::Interrupted
            }
        };

        handle.cancel().await;
        stats.apply_schedule(&handle.summary());
        drop(handle);
        drop(scheduler);

        match Arc::try_unwrap(registry) {
            Ok(mut registry) => registry.close_all().await,
            Err(_) => warn!("broker registry still shared, connections dropped without close"),
        }

        stats.duration = start_time.elapsed();
        info!(
            fired = stats.events_fired,
            dropped = stats.events_dropped,
            failed = stats.events_failed,
            cancelled = stats.events_cancelled,
            duration_secs = stats.duration.as_secs_f64(),
            "Replay finished"
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker_registry::MockBroker;
    use contracts::{ArtifactConfig, BrokerConfig, BrokerEndpoint, StakeholderConfig};
    use std::fs;
    use tempfile::TempDir;

    fn fixture(dir: &TempDir) -> EmulatorBlueprint {
        let leg = dir.path().join("shipment-1-data/AMS-CDG");
        fs::create_dir_all(&leg).unwrap();
        fs::write(leg.join("06-AMS-CDG-stakeholder.csv"), "0;state;loading\n20;state;departed\n")
            .unwrap();
        fs::write(leg.join("06-AMS-CDG-truckA.csv"), "10;temp;5;humidity;60\n").unwrap();

        EmulatorBlueprint {
            brokers: vec![BrokerConfig {
                host: "localhost".into(),
                port: 1883,
                user: String::new(),
                password: String::new(),
            }],
            stakeholders: vec![StakeholderConfig {
                name: "Carrier".into(),
                process_instance: "I1".into(),
                host: "localhost".into(),
                port: 1883,
                stream_file_path: "shipment-1-data/AMS-CDG/06-AMS-CDG-stakeholder.csv".into(),
            }],
            artifacts: vec![ArtifactConfig {
                name: "Truck".into(),
                id: "T1".into(),
                host: "localhost".into(),
                port: 1883,
                stream_file_path: "shipment-1-data/AMS-CDG/06-AMS-CDG-truckA.csv".into(),
            }],
            ..Default::default()
        }
    }

    fn config(blueprint: EmulatorBlueprint, dir: &TempDir) -> PipelineConfig {
        PipelineConfig {
            blueprint,
            selection: Selection::All,
            base_dir: Some(dir.path().to_path_buf()),
            speed: 1.0,
            timeout: None,
            metrics_port: None,
        }
    }

    #[test]
    fn test_plan() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(config(fixture(&dir), &dir));

        let plan = pipeline.plan().unwrap();
        assert_eq!(plan.topology.len(), 2);
        assert_eq!(plan.events.total_events(), 3);
        assert!(plan.load_report.failed.is_empty());
    }

    #[tokio::test]
    async fn test_run_with_mock_transport() {
        let dir = TempDir::new().unwrap();
        let broker = MockBroker::new();
        let pipeline = Pipeline::new(config(fixture(&dir), &dir));

        let stats = pipeline
            .run_with(broker.clone(), std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.completion, Completion::AllFired);
        assert_eq!(stats.events_fired, 3);
        assert_eq!(stats.instances_announced, 1);
        assert_eq!(broker.published_to("Carrier/I1").len(), 2);
        assert_eq!(broker.published_to("Truck/T1/status").len(), 1);
        assert_eq!(broker.closed(), vec![BrokerEndpoint::new("localhost", 1883)]);
    }

    #[tokio::test]
    async fn test_timeout_cancels_pending() {
        let dir = TempDir::new().unwrap();
        let bp = fixture(&dir);
        fs::write(
            dir.path().join("shipment-1-data/AMS-CDG/06-AMS-CDG-truckA.csv"),
            "0;temp;5\n60000;temp;6\n",
        )
        .unwrap();
        let mut cfg = config(bp, &dir);
        cfg.timeout = Some(Duration::from_millis(200));

        let stats = Pipeline::new(cfg)
            .run_with(MockBroker::new(), std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.completion, Completion::Timeout);
        assert_eq!(stats.events_cancelled, 1);
        assert_eq!(stats.events_fired, 3);
    }

    #[tokio::test]
    async fn test_shutdown_signal_interrupts() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(fixture(&dir), &dir);
        cfg.speed = 0.1;

        let stats = Pipeline::new(cfg)
            .run_with(MockBroker::new(), tokio::time::sleep(Duration::from_millis(50)))
            .await
            .unwrap();

        assert_eq!(stats.completion, Completion::Interrupted);
        assert!(stats.events_cancelled >= 1);
    }

    #[tokio::test]
    async fn test_duplicate_key_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut bp = fixture(&dir);
        bp.stakeholders.push(bp.stakeholders[0].clone());

        let result = Pipeline::new(config(bp, &dir))
            .run_with(MockBroker::new(), std::future::pending())
            .await;

        assert!(matches!(result, Err(crate::error::CliError::Topology(_))));
    }
}
