//! # Dispatcher
//!
//! Timed event dispatch.
//!
//! Responsibilities:
//! - Arm one timer per event at `run start + relative offset / speed`
//! - Build topic and payload per entity kind at fire time
//! - Publish through the broker registry; drop events for unknown brokers
//! - Keep timers independent so a slow broker delays only its own events

pub mod error;
pub mod handle;
pub mod metrics;
pub mod payload;
pub mod scheduler;

pub use error::DispatcherError;
pub use handle::{ScheduleHandle, ScheduleSummary};
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use payload::{build_payload, encode_payload, fire_timestamp, payload_data, TIMESTAMP_FIELD};
pub use scheduler::{DispatchScheduler, FireOutcome, FireReport, MIN_SPEED};
