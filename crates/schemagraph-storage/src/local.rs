//! Local filesystem adapter

use crate::{StorageAdapter, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Serves corpus paths from a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalAdapter {
    root: PathBuf,
}

impl LocalAdapter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, corpus_path: &str) -> Result<PathBuf, StorageError> {
        self.create_adapter_path(corpus_path)
            .map(PathBuf::from)
            .ok_or_else(|| StorageError::UnmappedPath(corpus_path.to_string()))
    }
}

#[async_trait]
impl StorageAdapter for LocalAdapter {
    fn create_adapter_path(&self, corpus_path: &str) -> Option<String> {
        let relative = corpus_path.trim_start_matches('/');
        if relative.split('/').any(|segment| segment == "..") {
            return None;
        }
        let mut full = self.root.clone();
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            full.push(segment);
        }
        Some(full.to_string_lossy().into_owned())
    }

    fn create_corpus_path(&self, adapter_path: &str) -> Option<String> {
        let relative = Path::new(adapter_path).strip_prefix(&self.root).ok()?;
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(format!("/{}", segments.join("/")))
    }

    async fn read(&self, corpus_path: &str) -> Result<String, StorageError> {
        let full = self.full_path(corpus_path)?;
        match tokio::fs::read_to_string(&full).await {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(corpus_path.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn compute_last_modified_time(
        &self,
        corpus_path: &str,
    ) -> Result<Option<DateTime<Utc>>, StorageError> {
        let full = self.full_path(corpus_path)?;
        match tokio::fs::metadata(&full).await {
            Ok(meta) => Ok(Some(DateTime::<Utc>::from(meta.modified()?))),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
