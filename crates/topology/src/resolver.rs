//! Topology resolution
//!
//! 1. Expand the selection into process instance ids (de-duplicated)
//! 2. Add selected stakeholders and record their instance prefixes
//! 3. Tie each artifact to the first instance whose prefix starts its path
//!
//! Stakeholders whose path yields no prefix are kept, but no artifact can
//! reach their instance.

use std::collections::{HashMap, HashSet};

use contracts::{
    ArtifactConfig, EmulatorBlueprint, Entity, EntityKey, Selection, StakeholderConfig,
};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, TopologyError};
use crate::prefix::{derive_prefix, process_type, PrefixTable};
use crate::topology::{ExcludedArtifact, ExclusionReason, SelectedInstance, Topology};

/// Topology resolver
pub struct TopologyResolver;

impl TopologyResolver {
    /// Resolve the entity set of a run
    ///
    /// # Errors
    /// `DuplicateEntityKey` if two included declarations share a key.
    #[instrument(
        name = "topology_resolve",
        skip(blueprint),
        fields(
            stakeholders = blueprint.stakeholders.len(),
            artifacts = blueprint.artifacts.len()
        )
    )]
    pub fn resolve(blueprint: &EmulatorBlueprint, selection: &Selection) -> Result<Topology> {
        let selected = Self::expand_selection(blueprint, selection);
        let selected_set: HashSet<&str> = selected.iter().map(String::as_str).collect();

        let mut builder = Builder::default();

        for stakeholder in &blueprint.stakeholders {
            if selected_set.contains(stakeholder.process_instance.as_str()) {
                builder.add_stakeholder(stakeholder)?;
            }
        }

        // Prefixes of every declared stakeholder, only used to explain exclusions
        let all_prefixes = Self::prefix_table(&blueprint.stakeholders);

        for artifact in &blueprint.artifacts {
            let matched = builder
                .prefixes
                .find(&artifact.stream_file_path)
                .map(str::to_string);

            match matched {
                Some(instance) if selected_set.contains(instance.as_str()) => {
                    builder.add_artifact(artifact, instance)?;
                }
                _ => {
                    let reason = match all_prefixes.find(&artifact.stream_file_path) {
                        Some(instance) => ExclusionReason::InstanceNotSelected {
                            process_instance: instance.to_string(),
                        },
                        None => ExclusionReason::NoPrefixMatch,
                    };
                    builder.exclude(artifact, reason);
                }
            }
        }

        let topology = builder.finish(blueprint, &selected);

        info!(
            instances = topology.instances.len(),
            stakeholders = topology.stakeholders().count(),
            artifacts = topology.artifacts().count(),
            excluded = topology.excluded.len(),
            "topology resolved"
        );
        Ok(topology)
    }

    /// Selected process instance ids, de-duplicated, first occurrence order
    ///
    /// `ProcessTypes` picks every stakeholder whose stream path's second
    /// segment is one of the types. `All` picks every declared instance.
    pub fn expand_selection(blueprint: &EmulatorBlueprint, selection: &Selection) -> Vec<String> {
        let candidates: Vec<&str> = match selection {
            Selection::All => blueprint
                .stakeholders
                .iter()
                .map(|s| s.process_instance.as_str())
                .collect(),
            Selection::Instances(instances) => instances.iter().map(String::as_str).collect(),
            Selection::ProcessTypes(types) => blueprint
                .stakeholders
                .iter()
                .filter(|s| {
                    process_type(&s.stream_file_path)
                        .is_some_and(|t| types.iter().any(|wanted| wanted == t))
                })
                .map(|s| s.process_instance.as_str())
                .collect(),
        };

        let mut seen = HashSet::new();
        let selected: Vec<String> = candidates
            .into_iter()
            .filter(|i| seen.insert(*i))
            .map(str::to_string)
            .collect();

        debug!(selection = ?selection, selected = ?selected, "selection expanded");
        selected
    }

    fn prefix_table(stakeholders: &[StakeholderConfig]) -> PrefixTable {
        let mut table = PrefixTable::new();
        for stakeholder in stakeholders {
            if let Some(prefix) = derive_prefix(&stakeholder.stream_file_path) {
                table.insert(stakeholder.process_instance.clone(), prefix);
            }
        }
        table
    }
}

#[derive(Default)]
struct Builder {
    entities: Vec<Entity>,
    positions: HashMap<EntityKey, usize>,
    prefixes: PrefixTable,
    excluded: Vec<ExcludedArtifact>,
}

impl Builder {
    fn push(&mut self, entity: Entity) -> Result<()> {
        if self.positions.contains_key(&entity.key) {
            return Err(TopologyError::DuplicateEntityKey { key: entity.key });
        }
        self.positions.insert(entity.key.clone(), self.entities.len());
        self.entities.push(entity);
        Ok(())
    }

    fn add_stakeholder(&mut self, stakeholder: &StakeholderConfig) -> Result<()> {
        let key = EntityKey::stakeholder(&stakeholder.name, &stakeholder.process_instance);

        match derive_prefix(&stakeholder.stream_file_path) {
            Some(prefix) => {
                debug!(
                    instance = %stakeholder.process_instance,
                    prefix = %prefix,
                    "instance prefix mapped"
                );
                self.prefixes
                    .insert(stakeholder.process_instance.clone(), prefix);
            }
            None => {
                warn!(
                    entity = %key,
                    path = %stakeholder.stream_file_path,
                    "stream path does not follow the naming convention, no artifacts can match this instance"
                );
            }
        }

        self.push(Entity {
            key,
            endpoint: stakeholder.endpoint(),
            stream_path: stakeholder.stream_file_path.clone(),
            process_instance: stakeholder.process_instance.clone(),
        })
    }

    fn add_artifact(&mut self, artifact: &ArtifactConfig, process_instance: String) -> Result<()> {
        let key = EntityKey::artifact(&artifact.name, &artifact.id);
        debug!(entity = %key, instance = %process_instance, "artifact matched");

        self.push(Entity {
            key,
            endpoint: artifact.endpoint(),
            stream_path: artifact.stream_file_path.clone(),
            process_instance,
        })
    }

    fn exclude(&mut self, artifact: &ArtifactConfig, reason: ExclusionReason) {
        let key = EntityKey::artifact(&artifact.name, &artifact.id);
        match &reason {
            ExclusionReason::NoPrefixMatch => warn!(
                entity = %key,
                path = %artifact.stream_file_path,
                "artifact matches no instance prefix, excluded"
            ),
            ExclusionReason::InstanceNotSelected { process_instance } => debug!(
                entity = %key,
                instance = %process_instance,
                "artifact belongs to an unselected instance, excluded"
            ),
        }
        self.excluded.push(ExcludedArtifact {
            key,
            stream_path: artifact.stream_file_path.clone(),
            reason,
        });
    }

    fn finish(self, blueprint: &EmulatorBlueprint, selected: &[String]) -> Topology {
        let instances = selected
            .iter()
            .map(|instance| {
                // Several stakeholders may declare one instance; the last one decides
                let declaring = blueprint
                    .stakeholders
                    .iter()
                    .rev()
                    .find(|s| &s.process_instance == instance);
                if declaring.is_none() {
                    warn!(instance = %instance, "selected instance has no stakeholder declaration");
                }
                SelectedInstance {
                    process_instance: instance.clone(),
                    process_type: declaring
                        .and_then(|s| process_type(&s.stream_file_path))
                        .map(str::to_string),
                }
            })
            .collect();

        Topology {
            entities: self.entities,
            positions: self.positions,
            prefixes: self.prefixes,
            instances,
            excluded: self.excluded,
        }
    }
}
