//! # Topology
//!
//! Decides which entities take part in a run.
//!
//! Responsibilities:
//! - Expand the instance / process-type selection
//! - Derive instance prefixes from stakeholder stream paths
//! - Tie artifacts to instances by path prefix (first match wins)
//! - Reject duplicate entity keys
//!
//! # Example
//!
//! ```no_run
//! use contracts::{EmulatorBlueprint, Selection};
//! use topology::TopologyResolver;
//!
//! let blueprint = EmulatorBlueprint::default();
//! let topology = TopologyResolver::resolve(&blueprint, &Selection::All).unwrap();
//! for entity in topology.entities() {
//!     println!("{} -> {}", entity.key, entity.key.topic());
//! }
//! ```

mod error;
mod prefix;
mod resolver;
mod topology;

pub use error::{Result, TopologyError};
pub use prefix::{derive_prefix, process_type, PrefixTable};
pub use resolver::TopologyResolver;
pub use topology::{ExcludedArtifact, ExclusionReason, SelectedInstance, Topology};
