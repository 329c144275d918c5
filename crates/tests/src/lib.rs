//! # Integration Tests
//!
//! End-to-end tests over the in-memory broker transport.
//!
//! Covers:
//! - Config -> topology -> streams -> scheduler -> broker wiring
//! - Failure isolation between entities
//! - Selection and connection idempotence

#[cfg(test)]
mod e2e_tests {
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    use broker_registry::{BrokerRegistry, MockBroker, MockBrokerConfig, PublishedMessage};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{BrokerEndpoint, EmulatorBlueprint, EntityKey, Selection};
    use dispatcher::{DispatchScheduler, FireOutcome, MetricsSnapshot};
    use serde_json::Value;
    use tempfile::TempDir;
    use topology::{Topology, TopologyResolver};

    const CONFIG: &str = r#"
[replay]
speed = 10.0

[[brokers]]
host = "localhost"
port = 1883

[[brokers]]
host = "localhost"
port = 1884

[[stakeholders]]
name = "Carrier"
process_instance = "I1"
host = "localhost"
port = 1883
stream_file_path = "shipment-1-data/AMS-CDG/06-AMS-CDG-carrier.csv"

[[stakeholders]]
name = "Carrier"
process_instance = "I2"
host = "localhost"
port = 1884
stream_file_path = "shipment-2-data/CDG-JFK/07-CDG-JFK-carrier.csv"

[[artifacts]]
name = "Truck"
id = "T1"
host = "localhost"
port = 1883
stream_file_path = "shipment-1-data/AMS-CDG/06-AMS-CDG-truckA.csv"

[[artifacts]]
name = "Container"
id = "C1"
host = "localhost"
port = 1884
stream_file_path = "shipment-2-data/CDG-JFK/07-CDG-JFK-container.csv"

[[artifacts]]
name = "Pallet"
id = "P1"
host = "localhost"
port = 1883
stream_file_path = "elsewhere/misc/01-misc-pallet.csv"
"#;

    fn write_stream(base: &Path, rel: &str, content: &str) {
        let path = base.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> (TempDir, EmulatorBlueprint) {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        write_stream(
            base,
            "shipment-1-data/AMS-CDG/06-AMS-CDG-carrier.csv",
            "0;state;loading\n100;state;departed\n",
        );
        write_stream(
            base,
            "shipment-1-data/AMS-CDG/06-AMS-CDG-truckA.csv",
            "50;temp;5;humidity;60\nnot-a-time;temp;6\n150;temp;7\n",
        );
        write_stream(
            base,
            "shipment-2-data/CDG-JFK/07-CDG-JFK-carrier.csv",
            "20;state;customs\n",
        );
        write_stream(
            base,
            "shipment-2-data/CDG-JFK/07-CDG-JFK-container.csv",
            "30;door;closed\n",
        );

        let blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        (dir, blueprint)
    }

    struct Run {
        broker: MockBroker,
        metrics: MetricsSnapshot,
        outcomes: Vec<(EntityKey, FireOutcome)>,
    }

    /// Drive one replay over the mock transport and wait for every timer
    async fn replay(
        blueprint: &EmulatorBlueprint,
        topology: &Topology,
        base: &Path,
        broker: MockBroker,
    ) -> Run {
        let (events, report) = ingestion::load_event_index(topology.entities(), Some(base));
        assert_eq!(report.loaded + report.failed.len(), topology.len());

        let mut registry = BrokerRegistry::new(broker.clone());
        registry.connect_all(&blueprint.brokers);
        let registry = Arc::new(registry);

        let scheduler =
            DispatchScheduler::new(Arc::clone(&registry)).with_speed(blueprint.replay.speed);
        let mut handle = scheduler.arm(topology, &events);
        handle.join().await;

        let outcomes = handle
            .reports()
            .iter()
            .map(|r| (r.key.clone(), r.outcome))
            .collect();
        let metrics = handle.summary().metrics;
        drop(handle);
        drop(scheduler);

        if let Ok(mut registry) = Arc::try_unwrap(registry) {
            registry.close_all().await;
        }

        Run {
            broker,
            metrics,
            outcomes,
        }
    }

    fn payload_data(msg: &PublishedMessage) -> serde_json::Map<String, Value> {
        let doc: Value = serde_json::from_slice(&msg.payload).unwrap();
        doc["event"]["payloadData"].as_object().unwrap().clone()
    }

    /// Config -> Topology -> Streams -> Scheduler -> MockBroker
    #[tokio::test]
    async fn test_e2e_full_replay() {
        let (dir, blueprint) = fixture();
        let topology = TopologyResolver::resolve(&blueprint, &Selection::All).unwrap();

        assert_eq!(topology.stakeholders().count(), 2);
        assert_eq!(topology.artifacts().count(), 2);
        assert_eq!(topology.excluded_artifacts().len(), 1);

        let run = replay(&blueprint, &topology, dir.path(), MockBroker::new()).await;

        assert_eq!(run.metrics.scheduled, 6);
        assert_eq!(run.metrics.fired, 6);
        assert_eq!(run.metrics.settled(), 6);

        // Stakeholders publish to name/instance, without timestamp
        let carrier = run.broker.published_to("Carrier/I1");
        assert_eq!(carrier.len(), 2);
        assert_eq!(carrier[0].endpoint, BrokerEndpoint::new("localhost", 1883));
        assert_eq!(payload_data(&carrier[0])["state"], "loading");
        assert_eq!(payload_data(&carrier[1])["state"], "departed");
        assert!(!payload_data(&carrier[0]).contains_key("timestamp"));

        // Artifacts publish to name/id/status with a fire-time timestamp
        let truck = run.broker.published_to("Truck/T1/status");
        assert_eq!(truck.len(), 2);
        let first = payload_data(&truck[0]);
        assert_eq!(first["temp"], "5");
        assert_eq!(first["humidity"], "60");
        assert!(first["timestamp"].as_i64().unwrap() > 0);
        assert_eq!(payload_data(&truck[1])["temp"], "7");

        let container = run.broker.published_to("Container/C1/status");
        assert_eq!(container.len(), 1);
        assert_eq!(container[0].endpoint, BrokerEndpoint::new("localhost", 1884));

        assert!(run.broker.published_to("Pallet/P1/status").is_empty());

        // Each endpoint opened once and closed at teardown
        assert_eq!(run.broker.connect_count(&BrokerEndpoint::new("localhost", 1883)), 1);
        assert_eq!(run.broker.connect_count(&BrokerEndpoint::new("localhost", 1884)), 1);
        assert_eq!(run.broker.closed().len(), 2);
    }

    /// Events of one entity arrive in relative-time order
    #[tokio::test]
    async fn test_e2e_per_entity_order() {
        let (dir, blueprint) = fixture();
        let topology = TopologyResolver::resolve(&blueprint, &Selection::All).unwrap();
        let run = replay(&blueprint, &topology, dir.path(), MockBroker::new()).await;

        let published = run.broker.published_to("Carrier/I1");
        let departed = published
            .iter()
            .position(|m| payload_data(m).get("state") == Some(&Value::from("departed")))
            .unwrap();
        let loading = published
            .iter()
            .position(|m| payload_data(m).get("state") == Some(&Value::from("loading")))
            .unwrap();
        assert!(loading < departed);

        let truck = run.broker.published_to("Truck/T1/status");
        assert!(truck[0].at <= truck[1].at);
    }

    /// An unreadable stream affects only its own entity
    #[tokio::test]
    async fn test_e2e_unreadable_stream_isolated() {
        let (dir, blueprint) = fixture();
        fs::remove_file(
            dir.path()
                .join("shipment-1-data/AMS-CDG/06-AMS-CDG-truckA.csv"),
        )
        .unwrap();

        let topology = TopologyResolver::resolve(&blueprint, &Selection::All).unwrap();
        let (_, report) = ingestion::load_event_index(topology.entities(), Some(dir.path()));
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, EntityKey::artifact("Truck", "T1"));

        let run = replay(&blueprint, &topology, dir.path(), MockBroker::new()).await;

        assert!(run.broker.published_to("Truck/T1/status").is_empty());
        assert_eq!(run.broker.published_to("Carrier/I1").len(), 2);
        assert_eq!(run.broker.published_to("Carrier/I2").len(), 1);
        assert_eq!(run.broker.published_to("Container/C1/status").len(), 1);
    }

    /// A broker that refuses the connection drops only its own events
    #[tokio::test]
    async fn test_e2e_failed_broker_isolated() {
        let (dir, blueprint) = fixture();
        let topology = TopologyResolver::resolve(&blueprint, &Selection::All).unwrap();
        let broker = MockBroker::with_config(MockBrokerConfig {
            fail_connect: vec![BrokerEndpoint::new("localhost", 1884)],
            ..Default::default()
        });

        let run = replay(&blueprint, &topology, dir.path(), broker).await;

        assert_eq!(run.metrics.dropped, 2);
        assert_eq!(run.metrics.fired, 4);
        assert!(run.broker.published_to("Carrier/I2").is_empty());
        assert!(run.broker.published_to("Container/C1/status").is_empty());
        assert_eq!(run.broker.published_to("Truck/T1/status").len(), 2);

        let dropped: Vec<_> = run
            .outcomes
            .iter()
            .filter(|(_, o)| *o == FireOutcome::Dropped)
            .map(|(k, _)| k.clone())
            .collect();
        assert!(dropped.contains(&EntityKey::stakeholder("Carrier", "I2")));
        assert!(dropped.contains(&EntityKey::artifact("Container", "C1")));
    }

    /// Replaying one instance publishes nothing of the other
    #[tokio::test]
    async fn test_e2e_instance_selection() {
        let (dir, blueprint) = fixture();
        let selection = Selection::Instances(vec!["I2".into()]);
        let topology = TopologyResolver::resolve(&blueprint, &selection).unwrap();

        let run = replay(&blueprint, &topology, dir.path(), MockBroker::new()).await;

        assert_eq!(run.metrics.fired, 2);
        assert_eq!(run.broker.published_to("Carrier/I2").len(), 1);
        assert_eq!(run.broker.published_to("Container/C1/status").len(), 1);
        assert!(run.broker.published_to("Carrier/I1").is_empty());
        assert!(run.broker.published_to("Truck/T1/status").is_empty());
    }

    /// Same selection, same topology; process type expands to its instances
    #[test]
    fn test_selection_idempotent() {
        let (_dir, blueprint) = fixture();

        let by_instance = Selection::Instances(vec!["I1".into()]);
        let a = TopologyResolver::resolve(&blueprint, &by_instance).unwrap();
        let b = TopologyResolver::resolve(&blueprint, &by_instance).unwrap();
        let keys = |t: &Topology| t.entities().iter().map(|e| e.key.clone()).collect::<Vec<_>>();
        assert_eq!(keys(&a), keys(&b));

        let by_type = Selection::ProcessTypes(vec!["AMS-CDG".into()]);
        let c = TopologyResolver::resolve(&blueprint, &by_type).unwrap();
        assert_eq!(keys(&a), keys(&c));
        assert!(a.contains(&EntityKey::stakeholder("Carrier", "I1")));
        assert!(a.contains(&EntityKey::artifact("Truck", "T1")));
        assert_eq!(a.len(), 2);
    }

    /// Repeated connect_all opens nothing new
    #[test]
    fn test_connection_idempotent() {
        let (_dir, blueprint) = fixture();
        let broker = MockBroker::new();
        let mut registry = BrokerRegistry::new(broker.clone());

        assert_eq!(registry.connect_all(&blueprint.brokers), 2);
        registry.connect_all(&blueprint.brokers);

        assert_eq!(registry.len(), 2);
        assert_eq!(broker.client_ids().len(), 2);
        for id in broker.client_ids() {
            assert!(id.starts_with("emulator-"));
        }
    }
}
