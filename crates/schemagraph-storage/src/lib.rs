//! Schemagraph storage layer
//!
//! Resolves corpus paths to concrete storage and answers the two questions the
//! object model asks of it:
//!
//! ```text
//!   corpus path ("local:/sales/part-0001.csv")
//!        │
//!        ▼
//!   ┌────────────────┐   namespace   ┌──────────────┐
//!   │ StorageManager │──────────────►│ StorageAdapter│──► last modified time
//!   └────────────────┘               └──────────────┘──► file content
//! ```
//!
//! - **Path algebra**: namespaces, folder-relative paths, `./` and `..`
//! - **Adapters**: local filesystem and in-memory, behind one async trait
//! - **Failures are typed**: callers decide whether a missing file or an
//!   unmounted namespace is fatal (the object model treats both as
//!   "no new information")

pub mod local;
pub mod manager;
pub mod memory;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use local::LocalAdapter;
pub use manager::{split_namespace_path, StorageManager};
pub use memory::MemoryAdapter;

/// Errors raised by adapters and the storage manager
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("namespace '{0}' is not mounted")]
    NamespaceNotMounted(String),
    #[error("no namespace given for '{0}' and no default namespace is set")]
    MissingNamespace(String),
    #[error("path '{0}' cannot be mapped by this adapter")]
    UnmappedPath(String),
    #[error("path '{0}' not found")]
    NotFound(String),
}

/// A backing store mounted under a namespace.
///
/// Paths handed to an adapter are namespace-free corpus paths that always
/// start with `/`.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    fn can_read(&self) -> bool {
        true
    }

    /// Map a corpus path to the adapter's own addressing scheme.
    fn create_adapter_path(&self, corpus_path: &str) -> Option<String>;

    /// Map an adapter path back to a namespace-free corpus path.
    fn create_corpus_path(&self, adapter_path: &str) -> Option<String>;

    async fn read(&self, corpus_path: &str) -> Result<String, StorageError>;

    /// Last modification time, `Ok(None)` when the file does not exist.
    async fn compute_last_modified_time(
        &self,
        corpus_path: &str,
    ) -> Result<Option<DateTime<Utc>>, StorageError>;
}
