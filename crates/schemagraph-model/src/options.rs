//! Per-call options for traversal, resolution and copying

use crate::NodeId;
use serde::{Deserialize, Serialize};

/// Controls declared-path caching for a single `visit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitOptions {
    /// When `false`, paths are computed for the callbacks but existing caches
    /// are neither read nor written.
    pub cache_declared_paths: bool,
}

impl Default for VisitOptions {
    fn default() -> Self {
        Self {
            cache_declared_paths: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Document searched after the referencing document when resolving names.
    pub wrt_doc: Option<NodeId>,
}

impl ResolveOptions {
    pub fn with_wrt_doc(doc: NodeId) -> Self {
        Self { wrt_doc: Some(doc) }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyOptions {
    /// Expand string references into `{identifier, corpusPath}` records.
    pub string_refs: bool,
}
