//! Folders, documents and manifests

use crate::NodeId;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FolderDef {
    pub name: String,
    /// Absolute corpus path ending with `/`.
    pub corpus_path: String,
    pub child_folders: Vec<NodeId>,
    pub documents: Vec<NodeId>,
}

impl FolderDef {
    pub fn new(name: impl Into<String>, corpus_path: impl Into<String>) -> Self {
        let mut corpus_path = corpus_path.into();
        if !corpus_path.ends_with('/') {
            corpus_path.push('/');
        }
        Self {
            name: name.into(),
            corpus_path,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDef {
    pub corpus_path: String,
    pub moniker: Option<String>,
}

/// A schema document (`*.cdm.json`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentDef {
    /// File name, e.g. `Customer.cdm.json`.
    pub name: String,
    /// Absolute path of the containing folder, ending with `/`.
    pub folder_path: String,
    pub json_schema_semantic_version: Option<String>,
    pub imports: Vec<ImportDef>,
    /// Top-level definitions in declaration order.
    pub definitions: Vec<NodeId>,
}

impl DocumentDef {
    pub fn new(name: impl Into<String>, folder_path: impl Into<String>) -> Self {
        let mut folder_path = folder_path.into();
        if !folder_path.ends_with('/') {
            folder_path.push('/');
        }
        Self {
            name: name.into(),
            folder_path,
            ..Self::default()
        }
    }

    /// Absolute corpus path of the document file.
    pub fn corpus_path(&self) -> String {
        format!("{}{}", self.folder_path, self.name)
    }
}

/// A manifest document: a document that also lists entities, partitions
/// and sub-manifests, and tracks their file status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestDef {
    pub manifest_name: String,
    pub explanation: Option<String>,
    pub document: DocumentDef,
    pub exhibits_traits: Vec<NodeId>,
    /// Local and referenced entity declarations.
    pub entities: Vec<NodeId>,
    /// Manifest declarations.
    pub sub_manifests: Vec<NodeId>,
    pub last_file_status_check_time: Option<DateTime<Utc>>,
    pub last_file_modified_time: Option<DateTime<Utc>>,
    pub last_child_file_modified_time: Option<DateTime<Utc>>,
}

impl ManifestDef {
    pub fn new(manifest_name: impl Into<String>, document: DocumentDef) -> Self {
        Self {
            manifest_name: manifest_name.into(),
            document,
            ..Self::default()
        }
    }
}
