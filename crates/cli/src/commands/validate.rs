//! `validate` command implementation.

use std::collections::HashSet;

use anyhow::{Context, Result};
use contracts::{EmulatorBlueprint, Selection};
use serde::Serialize;
use topology::{derive_prefix, ExclusionReason, TopologyResolver};
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    broker_count: usize,
    artifact_count: usize,
    stakeholder_count: usize,
    instance_count: usize,
    speed: f64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return invalid(config_path, format!("File not found: {}", args.config.display()));
    }

    let blueprint = match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => blueprint,
        Err(e) => return invalid(config_path, e.to_string()),
    };

    // Resolution catches what the schema cannot, e.g. duplicate keys
    let topology = match TopologyResolver::resolve(&blueprint, &Selection::All) {
        Ok(topology) => topology,
        Err(e) => return invalid(config_path, e.to_string()),
    };

    let mut warnings = collect_warnings(&blueprint);
    for excluded in topology.excluded_artifacts() {
        if excluded.reason == ExclusionReason::NoPrefixMatch {
            warnings.push(format!(
                "Artifact '{}' matches no stakeholder stream prefix and will never be replayed",
                excluded.key
            ));
        }
    }

    ValidationResult {
        valid: true,
        config_path,
        error: None,
        warnings: if warnings.is_empty() {
            None
        } else {
            Some(warnings)
        },
        summary: Some(ConfigSummary {
            broker_count: blueprint.brokers.len(),
            artifact_count: blueprint.artifacts.len(),
            stakeholder_count: blueprint.stakeholders.len(),
            instance_count: topology.selected_instances().len(),
            speed: blueprint.replay.speed,
        }),
    }
}

fn invalid(config_path: String, error: String) -> ValidationResult {
    ValidationResult {
        valid: false,
        config_path,
        error: Some(error),
        warnings: None,
        summary: None,
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &EmulatorBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.brokers.is_empty() {
        warnings.push("No brokers configured - every event will be dropped".to_string());
    }

    // Later declarations of the same endpoint are ignored at connect time
    let mut declared = HashSet::new();
    for broker in &blueprint.brokers {
        if !declared.insert(broker.endpoint()) {
            warnings.push(format!(
                "Broker {} declared more than once - only the first declaration is used",
                broker.endpoint()
            ));
        }
    }

    let endpoints = blueprint
        .artifacts
        .iter()
        .map(|a| (format!("Artifact '{}/{}'", a.name, a.id), a.endpoint()))
        .chain(blueprint.stakeholders.iter().map(|s| {
            (
                format!("Stakeholder '{}/{}'", s.name, s.process_instance),
                s.endpoint(),
            )
        }));
    for (label, endpoint) in endpoints {
        if !declared.contains(&endpoint) {
            warnings.push(format!(
                "{} uses undeclared broker {} - its events will be dropped",
                label, endpoint
            ));
        }
    }

    for stakeholder in &blueprint.stakeholders {
        if derive_prefix(&stakeholder.stream_file_path).is_none() {
            warnings.push(format!(
                "Stakeholder '{}/{}' stream path '{}' yields no instance prefix - no artifacts will attach to it",
                stakeholder.name, stakeholder.process_instance, stakeholder.stream_file_path
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Brokers: {}", summary.broker_count);
            println!("  Artifacts: {}", summary.artifact_count);
            println!("  Stakeholders: {}", summary.stakeholder_count);
            println!("  Process instances: {}", summary.instance_count);
            println!("  Speed: {}x", summary.speed);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ArtifactConfig, BrokerConfig, StakeholderConfig};

    fn broker(port: u16) -> BrokerConfig {
        BrokerConfig {
            host: "localhost".into(),
            port,
            user: String::new(),
            password: String::new(),
        }
    }

    #[test]
    fn test_clean_config_has_no_warnings() {
        let bp = EmulatorBlueprint {
            brokers: vec![broker(1883)],
            stakeholders: vec![StakeholderConfig {
                name: "Carrier".into(),
                process_instance: "I1".into(),
                host: "localhost".into(),
                port: 1883,
                stream_file_path: "s/AMS-CDG/06-AMS-CDG-stakeholder.csv".into(),
            }],
            ..Default::default()
        };
        assert!(collect_warnings(&bp).is_empty());
    }

    #[test]
    fn test_warnings() {
        let bp = EmulatorBlueprint {
            brokers: vec![broker(1883), broker(1883)],
            artifacts: vec![ArtifactConfig {
                name: "Truck".into(),
                id: "T1".into(),
                host: "localhost".into(),
                port: 1884,
                stream_file_path: "s/AMS-CDG/06-AMS-CDG-truck.csv".into(),
            }],
            stakeholders: vec![StakeholderConfig {
                name: "Carrier".into(),
                process_instance: "I1".into(),
                host: "localhost".into(),
                port: 1883,
                stream_file_path: "flat.csv".into(),
            }],
            ..Default::default()
        };

        let warnings = collect_warnings(&bp);
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("more than once"));
        assert!(warnings[1].contains("localhost:1884"));
        assert!(warnings[2].contains("no instance prefix"));
    }
}
