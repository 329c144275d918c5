//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::EventIndex;
use serde::Serialize;
use topology::{ExclusionReason, Topology, TopologyResolver};
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Topology info for JSON output
#[derive(Serialize)]
struct TopologyInfo {
    brokers: Vec<String>,
    instances: Vec<InstanceInfo>,
    entities: Vec<EntityInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    excluded_artifacts: Vec<ExcludedInfo>,
}

#[derive(Serialize)]
struct InstanceInfo {
    process_instance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    process_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prefix: Option<String>,
}

#[derive(Serialize)]
struct EntityInfo {
    kind: &'static str,
    key: String,
    topic: String,
    broker: String,
    process_instance: String,
    stream_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    events: Option<usize>,
}

#[derive(Serialize)]
struct ExcludedInfo {
    key: String,
    stream_path: String,
    reason: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading topology info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let selection = args.selection.selection()?;
    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let topology = TopologyResolver::resolve(&blueprint, &selection).map_err(CliError::from)?;

    let events = if args.events {
        let base_dir = args.base_dir.as_deref().or(blueprint.replay.base_dir.as_deref());
        let (index, _) = ingestion::load_event_index(topology.entities(), base_dir);
        Some(index)
    } else {
        None
    };

    let info = build_topology_info(&blueprint, &topology, events.as_ref());
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize topology info")?;
        println!("{}", json);
    } else {
        print_topology_info(&info);
    }

    Ok(())
}

fn build_topology_info(
    blueprint: &contracts::EmulatorBlueprint,
    topology: &Topology,
    events: Option<&EventIndex>,
) -> TopologyInfo {
    let instances = topology
        .selected_instances()
        .iter()
        .map(|i| InstanceInfo {
            process_instance: i.process_instance.clone(),
            process_type: i.process_type.clone(),
            prefix: topology
                .prefixes()
                .get(&i.process_instance)
                .map(str::to_string),
        })
        .collect();

    let entities = topology
        .entities()
        .iter()
        .map(|e| EntityInfo {
            kind: e.kind().as_str(),
            key: e.key.to_string(),
            topic: e.key.topic(),
            broker: e.endpoint.to_string(),
            process_instance: e.process_instance.clone(),
            stream_path: e.stream_path.clone(),
            events: events.map(|index| index.get(&e.key).map_or(0, <[_]>::len)),
        })
        .collect();

    let excluded_artifacts = topology
        .excluded_artifacts()
        .iter()
        .map(|x| ExcludedInfo {
            key: x.key.to_string(),
            stream_path: x.stream_path.clone(),
            reason: match &x.reason {
                ExclusionReason::NoPrefixMatch => "no stakeholder prefix matches".to_string(),
                ExclusionReason::InstanceNotSelected { process_instance } => {
                    format!("instance {} not selected", process_instance)
                }
            },
        })
        .collect();

    TopologyInfo {
        brokers: blueprint
            .brokers
            .iter()
            .map(|b| b.endpoint().to_string())
            .collect(),
        instances,
        entities,
        excluded_artifacts,
    }
}

fn print_topology_info(info: &TopologyInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Stream Emulator Topology                       ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📡 Brokers ({})", info.brokers.len());
    print_tree(info.brokers.iter().map(String::as_str));

    println!("\n🧭 Process Instances ({})", info.instances.len());
    print_tree(info.instances.iter().map(|i| {
        format!(
            "{} [{}] prefix: {}",
            i.process_instance,
            i.process_type.as_deref().unwrap_or("?"),
            i.prefix.as_deref().unwrap_or("(none)")
        )
    }));

    println!("\n📦 Entities ({})", info.entities.len());
    print_tree(info.entities.iter().map(|e| {
        let events = e
            .events
            .map(|n| format!(", {} events", n))
            .unwrap_or_default();
        format!("[{}] {} -> {} via {}{}", e.kind, e.key, e.topic, e.broker, events)
    }));

    if !info.excluded_artifacts.is_empty() {
        println!("\n🚫 Excluded Artifacts ({})", info.excluded_artifacts.len());
        print_tree(
            info.excluded_artifacts
                .iter()
                .map(|x| format!("{} ({})", x.key, x.reason)),
        );
    }

    println!();
}

fn print_tree<I, S>(items: I)
where
    I: IntoIterator<Item = S>,
    S: std::fmt::Display,
{
    let items: Vec<S> = items.into_iter().collect();
    for (i, item) in items.iter().enumerate() {
        let prefix = if i == items.len() - 1 { "└─" } else { "├─" };
        println!("   {} {}", prefix, item);
    }
}
