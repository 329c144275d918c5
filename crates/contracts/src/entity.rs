//! Entity - Topology Resolver output
//!
//! Artifacts and stakeholders that emit replayed events.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::BrokerEndpoint;

/// Entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Artifact,
    Stakeholder,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Artifact => "artifact",
            Self::Stakeholder => "stakeholder",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity identity
///
/// Artifacts are keyed by artifact id, stakeholders by process instance.
/// The two variants never compare equal, even when their rendered
/// `name/discriminator` strings coincide.
///
/// # Examples
/// ```
/// use contracts::EntityKey;
///
/// let truck = EntityKey::artifact("Truck", "T1");
/// assert_eq!(truck.to_string(), "Truck/T1");
/// assert_eq!(truck.topic(), "Truck/T1/status");
///
/// let carrier = EntityKey::stakeholder("Carrier", "I1");
/// assert_eq!(carrier.topic(), "Carrier/I1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityKey {
    Artifact { name: String, id: String },
    Stakeholder { name: String, process_instance: String },
}

impl EntityKey {
    pub fn artifact(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Artifact {
            name: name.into(),
            id: id.into(),
        }
    }

    pub fn stakeholder(name: impl Into<String>, process_instance: impl Into<String>) -> Self {
        Self::Stakeholder {
            name: name.into(),
            process_instance: process_instance.into(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Artifact { .. } => EntityKind::Artifact,
            Self::Stakeholder { .. } => EntityKind::Stakeholder,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Artifact { name, .. } | Self::Stakeholder { name, .. } => name,
        }
    }

    /// Artifact id or process instance
    pub fn discriminator(&self) -> &str {
        match self {
            Self::Artifact { id, .. } => id,
            Self::Stakeholder {
                process_instance, ..
            } => process_instance,
        }
    }

    /// Publish topic: stakeholders use their key, artifacts `<key>/status`
    pub fn topic(&self) -> String {
        match self.kind() {
            EntityKind::Artifact => format!("{self}/status"),
            EntityKind::Stakeholder => self.to_string(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name(), self.discriminator())
    }
}

/// Resolved entity, immutable after topology resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub key: EntityKey,

    /// Broker the entity publishes through
    pub endpoint: BrokerEndpoint,

    /// Declared stream path (unresolved)
    pub stream_path: String,

    /// Owning process instance (declared for stakeholders, inferred for artifacts)
    pub process_instance: String,
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        self.key.kind()
    }
}
