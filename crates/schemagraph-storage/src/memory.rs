//! In-memory adapter with settable modification times

use crate::{StorageAdapter, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct MemoryFile {
    content: String,
    modified: Option<DateTime<Utc>>,
}

/// Holds files in a map keyed by namespace-free corpus path.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    files: RwLock<HashMap<String, MemoryFile>>,
}

fn key(corpus_path: &str) -> String {
    if corpus_path.starts_with('/') {
        corpus_path.to_string()
    } else {
        format!("/{corpus_path}")
    }
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&self, corpus_path: &str, content: impl Into<String>, modified: DateTime<Utc>) {
        self.files.write().insert(
            key(corpus_path),
            MemoryFile {
                content: content.into(),
                modified: Some(modified),
            },
        );
    }

    /// Set the modification time, creating an empty file when absent.
    pub fn touch(&self, corpus_path: &str, modified: DateTime<Utc>) {
        let mut files = self.files.write();
        files
            .entry(key(corpus_path))
            .and_modify(|f| f.modified = Some(modified))
            .or_insert(MemoryFile {
                content: String::new(),
                modified: Some(modified),
            });
    }

    pub fn remove(&self, corpus_path: &str) -> bool {
        self.files.write().remove(&key(corpus_path)).is_some()
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

#[async_trait]
impl StorageAdapter for MemoryAdapter {
    fn create_adapter_path(&self, corpus_path: &str) -> Option<String> {
        Some(key(corpus_path))
    }

    fn create_corpus_path(&self, adapter_path: &str) -> Option<String> {
        Some(key(adapter_path))
    }

    async fn read(&self, corpus_path: &str) -> Result<String, StorageError> {
        self.files
            .read()
            .get(&key(corpus_path))
            .map(|f| f.content.clone())
            .ok_or_else(|| StorageError::NotFound(corpus_path.to_string()))
    }

    async fn compute_last_modified_time(
        &self,
        corpus_path: &str,
    ) -> Result<Option<DateTime<Utc>>, StorageError> {
        Ok(self
            .files
            .read()
            .get(&key(corpus_path))
            .and_then(|f| f.modified))
    }
}
