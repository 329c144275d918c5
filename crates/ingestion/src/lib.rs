//! # Ingestion
//!
//! Stream file ingestion.
//!
//! Responsibilities:
//! - Parse `;`-delimited stream lines into `StreamEvent`s
//! - Skip malformed lines without aborting the file
//! - Load every entity's stream into an `EventIndex`, isolating unreadable files
//!
//! ## Usage Example
//!
//! ```no_run
//! use ingestion::load_event_index;
//! # let entities: Vec<contracts::Entity> = Vec::new();
//!
//! let (index, report) = load_event_index(&entities, None);
//! println!("{} events, {} failed files", index.total_events(), report.failed.len());
//! ```

mod error;
mod loader;
mod parser;

// Re-exports
pub use contracts::{EventIndex, StreamEvent};
pub use error::{IngestionError, Result};
pub use loader::{load_event_index, load_stream, resolve_stream_path, LoadReport};
pub use parser::{parse_stream, ParsedStream, FIELD_DELIMITER};
