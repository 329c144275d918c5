//! Selection - which process instances take part in a run

/// Instance selection criterion
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// Every declared process instance
    #[default]
    All,
    /// Explicit process instance ids
    Instances(Vec<String>),
    /// Process type names, expanded through stakeholder stream paths
    ProcessTypes(Vec<String>),
}

impl Selection {
    /// Build from the two mutually exclusive CLI lists
    ///
    /// Blank entries are ignored; an empty list counts as not given.
    /// Returns `None` when both lists are non-empty.
    pub fn from_lists(instances: &[String], process_types: &[String]) -> Option<Self> {
        let instances = non_blank(instances);
        let process_types = non_blank(process_types);

        match (instances.is_empty(), process_types.is_empty()) {
            (false, false) => None,
            (false, true) => Some(Self::Instances(instances)),
            (true, false) => Some(Self::ProcessTypes(process_types)),
            (true, true) => Some(Self::All),
        }
    }
}

fn non_blank(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}
