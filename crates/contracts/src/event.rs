//! StreamEvent - Ingestion output
//!
//! One replayed occurrence plus the per-entity event index handed to the scheduler.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::EntityKey;

/// One recorded event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// Offset from run start, milliseconds
    pub relative_time: u64,

    /// Name/value pairs in source order; duplicate names are kept here
    /// and resolved (last wins) when the payload is built
    pub fields: Vec<(String, String)>,
}

impl StreamEvent {
    pub fn new(relative_time: u64, fields: Vec<(String, String)>) -> Self {
        Self {
            relative_time,
            fields,
        }
    }
}

/// Entity key -> ordered event list
///
/// Built once during setup, then only read by the scheduler.
#[derive(Debug, Clone, Default)]
pub struct EventIndex {
    events: HashMap<EntityKey, Vec<StreamEvent>>,
}

impl EventIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity with an empty event list (no-op if present)
    pub fn register(&mut self, key: EntityKey) {
        self.events.entry(key).or_default();
    }

    /// Replace the event list of an entity
    pub fn insert(&mut self, key: EntityKey, events: Vec<StreamEvent>) {
        self.events.insert(key, events);
    }

    pub fn get(&self, key: &EntityKey) -> Option<&[StreamEvent]> {
        self.events.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.events.contains_key(key)
    }

    /// Number of registered entities
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total events across all entities
    pub fn total_events(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityKey, &[StreamEvent])> {
        self.events.iter().map(|(k, v)| (k, v.as_slice()))
    }
}
