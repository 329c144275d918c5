//! Stream file loading
//!
//! Failure isolation: an unreadable file leaves its entity with an empty
//! event list and never stops other entities from loading.

use std::path::{Path, PathBuf};

use contracts::{Entity, EntityKey, EventIndex};
use tracing::{debug, error, info, instrument};

use crate::error::{IngestionError, Result};
use crate::parser::{parse_stream, ParsedStream};

/// Outcome of loading every entity's stream
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Entities whose stream parsed (possibly with skipped lines)
    pub loaded: usize,
    /// Entities whose stream could not be read
    pub failed: Vec<(EntityKey, String)>,
    /// Events across all loaded streams
    pub events: usize,
    /// Malformed lines across all loaded streams
    pub skipped_lines: usize,
}

/// Resolve a declared stream path against an optional base directory
///
/// Absolute paths are returned unchanged.
pub fn resolve_stream_path(declared: &str, base_dir: Option<&Path>) -> PathBuf {
    let declared = Path::new(declared);
    match base_dir {
        Some(base) if declared.is_relative() => base.join(declared),
        _ => declared.to_path_buf(),
    }
}

/// Read and parse one stream file
#[instrument(name = "ingestion_load_stream", fields(path = %path.display()))]
pub fn load_stream(path: &Path) -> Result<ParsedStream> {
    let bytes = std::fs::read(path).map_err(|source| IngestionError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let content = String::from_utf8(bytes).map_err(|_| IngestionError::InvalidEncoding {
        path: path.to_path_buf(),
    })?;

    let parsed = parse_stream(&path.display().to_string(), &content);
    debug!(
        events = parsed.events.len(),
        skipped = parsed.skipped,
        "stream parsed"
    );
    Ok(parsed)
}

/// Build the event index for a set of entities
///
/// Every entity is registered, so each key has a list even when its file
/// failed to load.
#[instrument(name = "ingestion_load_event_index", skip(entities))]
pub fn load_event_index<'a, I>(entities: I, base_dir: Option<&Path>) -> (EventIndex, LoadReport)
where
    I: IntoIterator<Item = &'a Entity>,
{
    let mut index = EventIndex::new();
    let mut report = LoadReport::default();

    for entity in entities {
        index.register(entity.key.clone());
        let path = resolve_stream_path(&entity.stream_path, base_dir);

        match load_stream(&path) {
            Ok(parsed) => {
                report.loaded += 1;
                report.events += parsed.events.len();
                report.skipped_lines += parsed.skipped;
                observability::record_lines_skipped(parsed.skipped);
                index.insert(entity.key.clone(), parsed.events);
            }
            Err(e) => {
                error!(entity = %entity.key, error = %e, "stream load failed, entity has no events");
                report.failed.push((entity.key.clone(), e.to_string()));
            }
        }
    }

    info!(
        entities = index.len(),
        loaded = report.loaded,
        failed = report.failed.len(),
        events = report.events,
        skipped_lines = report.skipped_lines,
        "event index built"
    );

    (index, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::BrokerEndpoint;
    use std::fs;
    use tempfile::TempDir;

    fn entity(key: EntityKey, stream_path: &str) -> Entity {
        Entity {
            process_instance: key.discriminator().to_string(),
            key,
            endpoint: BrokerEndpoint::new("localhost", 1883),
            stream_path: stream_path.to_string(),
        }
    }

    #[test]
    fn test_resolve_stream_path() {
        let base = Path::new("/data");
        assert_eq!(
            resolve_stream_path("a/b.csv", Some(base)),
            PathBuf::from("/data/a/b.csv")
        );
        assert_eq!(resolve_stream_path("a/b.csv", None), PathBuf::from("a/b.csv"));
        assert_eq!(
            resolve_stream_path("/abs/b.csv", Some(base)),
            PathBuf::from("/abs/b.csv")
        );
    }

    #[test]
    fn test_load_stream_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = load_stream(&dir.path().join("missing.csv"));
        assert!(matches!(result, Err(IngestionError::Unreadable { .. })));
    }

    #[test]
    fn test_load_stream_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, [0xff, 0xfe, b';']).unwrap();
        assert!(matches!(
            load_stream(&path),
            Err(IngestionError::InvalidEncoding { .. })
        ));
    }

    #[test]
    fn test_unreadable_file_isolated() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("s/AMS-CDG")).unwrap();
        fs::write(
            dir.path().join("s/AMS-CDG/06-AMS-CDG-stakeholder.csv"),
            "10;state;loading\n20;state;departed\n",
        )
        .unwrap();

        let good = entity(
            EntityKey::stakeholder("Carrier", "I1"),
            "s/AMS-CDG/06-AMS-CDG-stakeholder.csv",
        );
        let bad = entity(EntityKey::artifact("Truck", "T1"), "s/AMS-CDG/06-AMS-CDG-truckA.csv");

        let (index, report) = load_event_index([&bad, &good], Some(dir.path()));

        assert_eq!(index.len(), 2);
        assert_eq!(index.get(&bad.key).map(<[_]>::len), Some(0));
        assert_eq!(index.get(&good.key).map(<[_]>::len), Some(2));
        assert_eq!(report.loaded, 1);
        assert_eq!(report.events, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, bad.key);
    }

    #[test]
    fn test_skipped_lines_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.csv"), "1;a;1\nbad\n2;a;2\n").unwrap();
        let e = entity(EntityKey::artifact("Box", "B1"), "a.csv");

        let (index, report) = load_event_index([&e], Some(dir.path()));

        assert_eq!(index.total_events(), 2);
        assert_eq!(report.skipped_lines, 1);
    }
}
