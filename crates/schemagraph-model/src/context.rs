//! Corpus-wide services shared by every node

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use schemagraph_storage::StorageManager;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Source of wall-clock time for status checks.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CorpusOptions {
    /// Default for `VisitOptions::cache_declared_paths`.
    pub cache_declared_paths: bool,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self {
            cache_declared_paths: true,
        }
    }
}

/// Read-mostly handle shared by the whole corpus.
#[derive(Debug)]
pub struct CorpusContext {
    pub storage: StorageManager,
    pub options: CorpusOptions,
    clock: Arc<dyn Clock>,
}

impl CorpusContext {
    pub fn new(storage: StorageManager) -> Self {
        Self {
            storage,
            options: CorpusOptions::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_options(mut self, options: CorpusOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
