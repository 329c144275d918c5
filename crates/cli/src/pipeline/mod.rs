//! Replay orchestration module.

mod control;
mod orchestrator;
mod stats;

pub use orchestrator::{Pipeline, PipelineConfig, ReplayPlan};
pub use stats::Completion;
