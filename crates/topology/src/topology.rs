//! Resolved run topology
//!
//! Immutable snapshot handed to ingestion and the scheduler.

use std::collections::HashMap;

use contracts::{Entity, EntityKey, EntityKind};

use crate::prefix::PrefixTable;

/// Why a declared artifact is not part of the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    /// No stakeholder prefix matches its stream path
    NoPrefixMatch,
    /// Its prefix belongs to an instance outside the selection
    InstanceNotSelected { process_instance: String },
}

/// Declared artifact left out of the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedArtifact {
    pub key: EntityKey,
    pub stream_path: String,
    pub reason: ExclusionReason,
}

/// Selected process instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedInstance {
    pub process_instance: String,
    /// From the first selected stakeholder declaring it
    pub process_type: Option<String>,
}

/// Entity set of one run
#[derive(Debug, Clone, Default)]
pub struct Topology {
    pub(crate) entities: Vec<Entity>,
    pub(crate) positions: HashMap<EntityKey, usize>,
    pub(crate) prefixes: PrefixTable,
    pub(crate) instances: Vec<SelectedInstance>,
    pub(crate) excluded: Vec<ExcludedArtifact>,
}

impl Topology {
    /// Entities: selected stakeholders, then matched artifacts, each in declaration order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn get(&self, key: &EntityKey) -> Option<&Entity> {
        self.positions.get(key).map(|&i| &self.entities[i])
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.positions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |e| e.kind() == kind)
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &Entity> {
        self.of_kind(EntityKind::Artifact)
    }

    pub fn stakeholders(&self) -> impl Iterator<Item = &Entity> {
        self.of_kind(EntityKind::Stakeholder)
    }

    /// Instance prefixes used for artifact matching
    pub fn prefixes(&self) -> &PrefixTable {
        &self.prefixes
    }

    /// Selected instances, de-duplicated, in selection order
    pub fn selected_instances(&self) -> &[SelectedInstance] {
        &self.instances
    }

    pub fn excluded_artifacts(&self) -> &[ExcludedArtifact] {
        &self.excluded
    }
}
