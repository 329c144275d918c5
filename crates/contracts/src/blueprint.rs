//! EmulatorBlueprint - Config Loader output
//!
//! Describes the parsed configuration tree: brokers, artifacts, stakeholders and replay settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::BrokerEndpoint;

/// Complete emulator configuration blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmulatorBlueprint {
    /// Replay settings
    #[serde(default)]
    pub replay: ReplayConfig,

    /// Broker declarations
    #[serde(default)]
    pub brokers: Vec<BrokerConfig>,

    /// Artifact declarations
    #[serde(default)]
    pub artifacts: Vec<ArtifactConfig>,

    /// Stakeholder declarations
    #[serde(default)]
    pub stakeholders: Vec<StakeholderConfig>,
}

/// Replay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Directory relative stream paths are resolved against
    #[serde(default)]
    pub base_dir: Option<PathBuf>,

    /// Replay speed multiplier (1.0 = recorded speed)
    #[serde(default = "default_speed")]
    pub speed: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            speed: default_speed(),
        }
    }
}

fn default_speed() -> f64 {
    1.0
}

/// Broker declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub host: String,

    pub port: u16,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,
}

impl BrokerConfig {
    pub fn endpoint(&self) -> BrokerEndpoint {
        BrokerEndpoint::new(&self.host, self.port)
    }
}

/// Artifact declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Artifact type name (e.g., "Truck")
    pub name: String,

    /// Artifact id, unique per name (e.g., "T1")
    pub id: String,

    pub host: String,

    pub port: u16,

    /// Recorded stream path; its filename prefix ties it to a process instance
    pub stream_file_path: String,
}

impl ArtifactConfig {
    pub fn endpoint(&self) -> BrokerEndpoint {
        BrokerEndpoint::new(&self.host, self.port)
    }
}

/// Stakeholder declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeholderConfig {
    /// Stakeholder role name (e.g., "Carrier")
    pub name: String,

    /// Process instance this stakeholder participates in
    pub process_instance: String,

    pub host: String,

    pub port: u16,

    /// Recorded stream path; second segment names the process type
    pub stream_file_path: String,
}

impl StakeholderConfig {
    pub fn endpoint(&self) -> BrokerEndpoint {
        BrokerEndpoint::new(&self.host, self.port)
    }
}
