//! Namespace mounts and corpus path algebra

use crate::{StorageAdapter, StorageError};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Split `ns:/a/b` into `(Some("ns"), "/a/b")`; paths without a namespace
/// come back unchanged.
pub fn split_namespace_path(path: &str) -> (Option<&str>, &str) {
    match path.find(':') {
        Some(idx) if idx > 0 && !path[..idx].contains('/') => (Some(&path[..idx]), &path[idx + 1..]),
        _ => (None, path),
    }
}

/// Collapse `.`/`..` segments and duplicate slashes. The result always starts
/// with `/` and keeps a trailing `/` when the input had one.
fn normalize(path: &str) -> String {
    let trailing = path.len() > 1 && path.ends_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    let mut out = format!("/{}", segments.join("/"));
    if trailing && !segments.is_empty() {
        out.push('/');
    }
    out
}

/// Folder part of an absolute path: folders end with `/`, anything else is a
/// document whose parent folder is used.
fn folder_of(path: &str) -> &str {
    if path.ends_with('/') {
        path
    } else {
        match path.rfind('/') {
            Some(idx) => &path[..=idx],
            None => "/",
        }
    }
}

/// Routes corpus paths to the adapter mounted under their namespace.
pub struct StorageManager {
    adapters: RwLock<BTreeMap<String, Arc<dyn StorageAdapter>>>,
    default_namespace: RwLock<Option<String>>,
}

impl fmt::Debug for StorageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageManager")
            .field("namespaces", &self.namespaces())
            .field("default_namespace", &self.default_namespace())
            .finish()
    }
}

impl Default for StorageManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageManager {
    pub fn new() -> Self {
        Self {
            adapters: RwLock::new(BTreeMap::new()),
            default_namespace: RwLock::new(None),
        }
    }

    pub fn mount(&self, namespace: &str, adapter: Arc<dyn StorageAdapter>) {
        tracing::debug!(namespace, "mounting storage adapter");
        self.adapters.write().insert(namespace.to_string(), adapter);
    }

    pub fn unmount(&self, namespace: &str) -> bool {
        let removed = self.adapters.write().remove(namespace).is_some();
        if removed {
            let mut default = self.default_namespace.write();
            if default.as_deref() == Some(namespace) {
                *default = None;
            }
        }
        removed
    }

    pub fn set_default_namespace(&self, namespace: impl Into<String>) {
        *self.default_namespace.write() = Some(namespace.into());
    }

    pub fn default_namespace(&self) -> Option<String> {
        self.default_namespace.read().clone()
    }

    pub fn namespaces(&self) -> Vec<String> {
        self.adapters.read().keys().cloned().collect()
    }

    pub fn fetch_adapter(&self, namespace: &str) -> Option<Arc<dyn StorageAdapter>> {
        self.adapters.read().get(namespace).cloned()
    }

    /// Make `path` absolute.
    ///
    /// `relative_to` is the absolute path of a folder (trailing `/`) or of a
    /// document inside one. Paths that already start with `/` keep their
    /// position but pick up the namespace of `relative_to` or the default
    /// namespace when they carry none. Empty input yields `None`.
    pub fn create_absolute_corpus_path(&self, path: &str, relative_to: Option<&str>) -> Option<String> {
        let path = path.trim();
        if path.is_empty() {
            return None;
        }

        let (namespace, rest) = split_namespace_path(path);
        let (base_namespace, base_path) = relative_to
            .map(split_namespace_path)
            .unwrap_or((None, "/"));

        let namespace = namespace
            .or(base_namespace)
            .map(str::to_string)
            .or_else(|| self.default_namespace());

        let joined = if rest.starts_with('/') {
            rest.to_string()
        } else {
            let folder = folder_of(base_path);
            if folder.starts_with('/') {
                format!("{folder}{rest}")
            } else {
                format!("/{folder}{rest}")
            }
        };

        let normalized = normalize(&joined);
        Some(match namespace {
            Some(ns) => format!("{ns}:{normalized}"),
            None => normalized,
        })
    }

    fn route(&self, absolute_path: &str) -> Result<(Arc<dyn StorageAdapter>, String), StorageError> {
        let (namespace, rest) = split_namespace_path(absolute_path);
        let namespace = namespace
            .map(str::to_string)
            .or_else(|| self.default_namespace())
            .ok_or_else(|| StorageError::MissingNamespace(absolute_path.to_string()))?;
        let adapter = self
            .fetch_adapter(&namespace)
            .ok_or(StorageError::NamespaceNotMounted(namespace))?;
        Ok((adapter, normalize(rest)))
    }

    pub fn corpus_path_to_adapter_path(&self, absolute_path: &str) -> Option<String> {
        let (adapter, rest) = self.route(absolute_path).ok()?;
        adapter.create_adapter_path(&rest)
    }

    /// First mounted adapter (in namespace order) that recognises the path.
    pub fn adapter_path_to_corpus_path(&self, adapter_path: &str) -> Option<String> {
        self.adapters
            .read()
            .iter()
            .find_map(|(ns, adapter)| adapter.create_corpus_path(adapter_path).map(|p| format!("{ns}:{p}")))
    }

    pub async fn read(&self, absolute_path: &str) -> Result<String, StorageError> {
        let (adapter, rest) = self.route(absolute_path)?;
        adapter.read(&rest).await
    }

    pub async fn compute_last_modified_time(
        &self,
        absolute_path: &str,
    ) -> Result<Option<DateTime<Utc>>, StorageError> {
        let (adapter, rest) = self.route(absolute_path)?;
        adapter.compute_last_modified_time(&rest).await
    }
}
