//! CLI configuration: which namespaces to mount and corpus-wide defaults

use anyhow::{Context, Result};
use schemagraph_model::{Corpus, CorpusContext, CorpusOptions};
use schemagraph_storage::{LocalAdapter, StorageManager};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceConfig {
    pub name: String,
    /// Directory the namespace is mounted on.
    pub root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CliConfig {
    pub namespaces: Vec<NamespaceConfig>,
    pub default_namespace: String,
    pub cache_declared_paths: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            namespaces: vec![NamespaceConfig {
                name: "local".to_string(),
                root: PathBuf::from("."),
            }],
            default_namespace: "local".to_string(),
            cache_declared_paths: true,
        }
    }
}

impl CliConfig {
    /// Read a JSON config file; defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn storage(&self) -> StorageManager {
        let storage = StorageManager::new();
        for namespace in &self.namespaces {
            tracing::debug!(namespace = %namespace.name, root = %namespace.root.display(), "mounting namespace");
            storage.mount(&namespace.name, Arc::new(LocalAdapter::new(namespace.root.clone())));
        }
        storage.set_default_namespace(self.default_namespace.clone());
        storage
    }

    pub fn corpus(&self) -> Corpus {
        let options = CorpusOptions {
            cache_declared_paths: self.cache_declared_paths,
        };
        Corpus::new(Arc::new(CorpusContext::new(self.storage()).with_options(options)))
    }
}
