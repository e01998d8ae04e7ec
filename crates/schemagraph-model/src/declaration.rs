//! Entity and sub-manifest declarations listed by a manifest

use crate::NodeId;
use chrono::{DateTime, Utc};

/// An entity whose data lives alongside the manifest, in partitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalEntityDeclarationDef {
    pub entity_name: String,
    /// Corpus path of the entity definition, `Doc.cdm.json/Entity`.
    pub entity_path: Option<String>,
    pub explanation: Option<String>,
    pub exhibits_traits: Vec<NodeId>,
    pub data_partitions: Vec<NodeId>,
    pub last_file_status_check_time: Option<DateTime<Utc>>,
    pub last_file_modified_time: Option<DateTime<Utc>>,
    pub last_child_file_modified_time: Option<DateTime<Utc>>,
}

impl LocalEntityDeclarationDef {
    pub fn new(entity_name: impl Into<String>, entity_path: Option<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            entity_path,
            ..Self::default()
        }
    }
}

/// An entity declared by another manifest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferencedEntityDeclarationDef {
    pub entity_name: String,
    pub entity_path: Option<String>,
    pub explanation: Option<String>,
    pub exhibits_traits: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestDeclarationDef {
    pub manifest_name: String,
    /// Corpus path of the sub-manifest document.
    pub definition: String,
    pub explanation: Option<String>,
    pub last_file_status_check_time: Option<DateTime<Utc>>,
    pub last_file_modified_time: Option<DateTime<Utc>>,
}

impl ManifestDeclarationDef {
    pub fn new(manifest_name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            manifest_name: manifest_name.into(),
            definition: definition.into(),
            ..Self::default()
        }
    }
}
