//! Configuration validation
//!
//! Rules:
//! - broker host non-empty, port > 0
//! - artifact / stakeholder identity fields and stream paths non-empty
//! - entity keys (`name/id`, `name/process_instance`) unique across the file
//! - replay speed > 0

use std::collections::HashSet;

use contracts::{ContractError, EmulatorBlueprint, EntityKey};

/// Validate an EmulatorBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &EmulatorBlueprint) -> Result<(), ContractError> {
    validate_brokers(blueprint)?;
    validate_artifacts(blueprint)?;
    validate_stakeholders(blueprint)?;
    validate_entity_keys(blueprint)?;
    validate_replay(blueprint)?;
    Ok(())
}

fn validate_brokers(blueprint: &EmulatorBlueprint) -> Result<(), ContractError> {
    for (idx, broker) in blueprint.brokers.iter().enumerate() {
        if broker.host.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("brokers[{idx}].host"),
                "broker host cannot be empty",
            ));
        }
        if broker.port == 0 {
            return Err(ContractError::config_validation(
                format!("brokers[{idx}].port"),
                "broker port must be > 0",
            ));
        }
    }
    Ok(())
}

fn validate_artifacts(blueprint: &EmulatorBlueprint) -> Result<(), ContractError> {
    for (idx, artifact) in blueprint.artifacts.iter().enumerate() {
        require_non_empty(&format!("artifacts[{idx}].name"), &artifact.name)?;
        require_non_empty(&format!("artifacts[{idx}].id"), &artifact.id)?;
        require_non_empty(&format!("artifacts[{idx}].host"), &artifact.host)?;
        require_non_empty(
            &format!("artifacts[{idx}].stream_file_path"),
            &artifact.stream_file_path,
        )?;
    }
    Ok(())
}

fn validate_stakeholders(blueprint: &EmulatorBlueprint) -> Result<(), ContractError> {
    for (idx, stakeholder) in blueprint.stakeholders.iter().enumerate() {
        require_non_empty(&format!("stakeholders[{idx}].name"), &stakeholder.name)?;
        require_non_empty(
            &format!("stakeholders[{idx}].process_instance"),
            &stakeholder.process_instance,
        )?;
        require_non_empty(&format!("stakeholders[{idx}].host"), &stakeholder.host)?;
        require_non_empty(
            &format!("stakeholders[{idx}].stream_file_path"),
            &stakeholder.stream_file_path,
        )?;
    }
    Ok(())
}

/// Entity key uniqueness (global)
fn validate_entity_keys(blueprint: &EmulatorBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();

    for artifact in &blueprint.artifacts {
        let key = EntityKey::artifact(&artifact.name, &artifact.id);
        if !seen.insert(key.clone()) {
            return Err(ContractError::config_validation(
                format!("artifacts[key={key}]"),
                "duplicate entity key",
            ));
        }
    }

    for stakeholder in &blueprint.stakeholders {
        let key = EntityKey::stakeholder(&stakeholder.name, &stakeholder.process_instance);
        if !seen.insert(key.clone()) {
            return Err(ContractError::config_validation(
                format!("stakeholders[key={key}]"),
                "duplicate entity key",
            ));
        }
    }

    Ok(())
}

fn validate_replay(blueprint: &EmulatorBlueprint) -> Result<(), ContractError> {
    let speed = blueprint.replay.speed;
    if !(speed.is_finite() && speed > 0.0) {
        return Err(ContractError::config_validation(
            "replay.speed",
            format!("speed must be > 0, got {speed}"),
        ));
    }
    Ok(())
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ContractError> {
    if value.trim().is_empty() {
        return Err(ContractError::config_validation(field, "cannot be empty"));
    }
    Ok(())
}
