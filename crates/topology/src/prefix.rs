//! Stream path conventions
//!
//! Stream files live at `<shipment>/<process-type>/<NN>-<leg>-<role>.csv`.
//! Files of one process instance share the `<dir>/<NN>-<leg>-` prefix, which
//! is how artifacts are tied to the stakeholder instance they belong to.

use std::sync::LazyLock;

use regex::Regex;

/// Leading digits, a hyphen, the leg (greedy), a hyphen, the rest of the name
static STREAM_FILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)-(.+)-[^/]+\.csv$").expect("static pattern is valid"));

/// Derive the instance prefix from a stakeholder stream path
///
/// Requires at least three `/`-separated segments and a file name matching
/// the convention. Returns `None` otherwise.
///
/// ```
/// use topology::derive_prefix;
///
/// assert_eq!(
///     derive_prefix("shipment-1-data/AMS-CDG/06-AMS-CDG-stakeholder.csv").as_deref(),
///     Some("shipment-1-data/AMS-CDG/06-AMS-CDG-"),
/// );
/// assert_eq!(derive_prefix("AMS-CDG/06-AMS-CDG-stakeholder.csv"), None);
/// ```
pub fn derive_prefix(stream_path: &str) -> Option<String> {
    let (dir, file_name) = stream_path.rsplit_once('/')?;
    if !dir.contains('/') {
        return None;
    }

    let caps = STREAM_FILE_NAME.captures(file_name)?;
    Some(format!("{dir}/{}-{}-", &caps[1], &caps[2]))
}

/// Process type of a stream path: its second segment
///
/// `shipment-1-data/AMS-CDG/...` -> `AMS-CDG`. An empty segment (`a//x.csv`)
/// is no process type.
pub fn process_type(stream_path: &str) -> Option<&str> {
    stream_path.split('/').nth(1).filter(|segment| !segment.is_empty())
}

/// Instance -> prefix table in first-insertion order
///
/// Re-inserting an instance replaces its prefix but keeps its position, so
/// lookup order is the order instances were first seen.
#[derive(Debug, Clone, Default)]
pub struct PrefixTable {
    entries: Vec<(String, String)>,
}

impl PrefixTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, instance: impl Into<String>, prefix: impl Into<String>) {
        let instance = instance.into();
        let prefix = prefix.into();
        match self.entries.iter_mut().find(|(i, _)| *i == instance) {
            Some(entry) => entry.1 = prefix,
            None => self.entries.push((instance, prefix)),
        }
    }

    /// First instance whose prefix starts `stream_path`
    pub fn find(&self, stream_path: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, prefix)| stream_path.starts_with(prefix.as_str()))
            .map(|(instance, _)| instance.as_str())
    }

    pub fn get(&self, instance: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(i, _)| i == instance)
            .map(|(_, p)| p.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (instance, prefix) pairs in lookup order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(i, p)| (i.as_str(), p.as_str()))
    }
}
