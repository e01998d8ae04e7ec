//! File-backed data partitions

use crate::NodeId;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// One data file of a local entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataPartitionDef {
    pub name: String,
    pub explanation: Option<String>,
    /// Corpus path of the data file, relative to the owning document.
    pub location: Option<String>,
    /// Discovered from a partition pattern rather than declared.
    pub inferred: bool,
    /// Substitution values captured from a location pattern.
    pub arguments: BTreeMap<String, Vec<String>>,
    pub specialized_schema: Option<String>,
    pub exhibits_traits: Vec<NodeId>,
    pub refresh_time: Option<DateTime<Utc>>,
    pub last_child_file_modified_time: Option<DateTime<Utc>>,
    /// Never decreases across status checks.
    pub last_file_modified_time: Option<DateTime<Utc>>,
    pub last_file_status_check_time: Option<DateTime<Utc>>,
}

impl DataPartitionDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn add_argument(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.arguments.entry(key.into()).or_default().push(value.into());
    }

    pub fn validate(&self) -> bool {
        !self.name.is_empty()
    }
}
