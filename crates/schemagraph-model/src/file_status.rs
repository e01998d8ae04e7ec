//! File-status capability and its propagation up the owner chain
//!
//! ```text
//!   Manifest            last_child_file_modified_time = max(...)
//!     ▲ report
//!   LocalEntityDeclaration   last_child_file_modified_time = max(...)
//!     ▲ report
//!   DataPartition       last_file_modified_time = max(observed, previous)
//!     │ file_status_check
//!     ▼
//!   storage: resolve location, fetch modified time
//! ```
//!
//! Ancestors never need to know what reported to them; a report stops at the
//! first owner that does not carry the capability.

use crate::declaration::{LocalEntityDeclarationDef, ManifestDeclarationDef};
use crate::document::ManifestDef;
use crate::error::{ModelError, Result};
use crate::partition::DataPartitionDef;
use crate::{Corpus, NodeId, ObjectType};
use chrono::{DateTime, Utc};

/// Later of two optional times; `None` only when both are.
pub fn max_time(first: Option<DateTime<Utc>>, second: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (first, second) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Nodes that track modification times of backing files.
pub trait FileStatus {
    fn last_file_status_check_time(&self) -> Option<DateTime<Utc>>;
    fn set_last_file_status_check_time(&mut self, time: Option<DateTime<Utc>>);
    fn last_file_modified_time(&self) -> Option<DateTime<Utc>>;
    fn set_last_file_modified_time(&mut self, time: Option<DateTime<Utc>>);

    fn last_child_file_modified_time(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn set_last_child_file_modified_time(&mut self, _time: Option<DateTime<Utc>>) {}

    /// Fold a reported time into this node and return the value to forward
    /// to the owner. Implementations must never move a stored time backwards.
    fn absorb_reported_time(&mut self, candidate: DateTime<Utc>) -> DateTime<Utc>;
}

macro_rules! status_fields {
    () => {
        fn last_file_status_check_time(&self) -> Option<DateTime<Utc>> {
            self.last_file_status_check_time
        }

        fn set_last_file_status_check_time(&mut self, time: Option<DateTime<Utc>>) {
            self.last_file_status_check_time = time;
        }

        fn last_file_modified_time(&self) -> Option<DateTime<Utc>> {
            self.last_file_modified_time
        }

        fn set_last_file_modified_time(&mut self, time: Option<DateTime<Utc>>) {
            self.last_file_modified_time = time;
        }
    };
}

impl FileStatus for DataPartitionDef {
    status_fields!();

    fn last_child_file_modified_time(&self) -> Option<DateTime<Utc>> {
        self.last_child_file_modified_time
    }

    fn set_last_child_file_modified_time(&mut self, time: Option<DateTime<Utc>>) {
        self.last_child_file_modified_time = time;
    }

    fn absorb_reported_time(&mut self, candidate: DateTime<Utc>) -> DateTime<Utc> {
        let latest = max_time(self.last_file_modified_time, Some(candidate)).unwrap_or(candidate);
        self.last_file_modified_time = Some(latest);
        latest
    }
}

impl FileStatus for ManifestDeclarationDef {
    status_fields!();

    fn absorb_reported_time(&mut self, candidate: DateTime<Utc>) -> DateTime<Utc> {
        let latest = max_time(self.last_file_modified_time, Some(candidate)).unwrap_or(candidate);
        self.last_file_modified_time = Some(latest);
        latest
    }
}

impl FileStatus for LocalEntityDeclarationDef {
    status_fields!();

    fn last_child_file_modified_time(&self) -> Option<DateTime<Utc>> {
        self.last_child_file_modified_time
    }

    fn set_last_child_file_modified_time(&mut self, time: Option<DateTime<Utc>>) {
        self.last_child_file_modified_time = time;
    }

    fn absorb_reported_time(&mut self, candidate: DateTime<Utc>) -> DateTime<Utc> {
        let latest = max_time(self.last_child_file_modified_time, Some(candidate)).unwrap_or(candidate);
        self.last_child_file_modified_time = Some(latest);
        latest
    }
}

impl FileStatus for ManifestDef {
    status_fields!();

    fn last_child_file_modified_time(&self) -> Option<DateTime<Utc>> {
        self.last_child_file_modified_time
    }

    fn set_last_child_file_modified_time(&mut self, time: Option<DateTime<Utc>>) {
        self.last_child_file_modified_time = time;
    }

    fn absorb_reported_time(&mut self, candidate: DateTime<Utc>) -> DateTime<Utc> {
        let latest = max_time(self.last_child_file_modified_time, Some(candidate)).unwrap_or(candidate);
        self.last_child_file_modified_time = Some(latest);
        latest
    }
}

/// Strip the definition name from `Doc.cdm.json/Entity`, leaving the file.
fn document_part(entity_path: &str) -> &str {
    match entity_path.rfind(".cdm.json/") {
        Some(idx) => &entity_path[..idx + ".cdm.json".len()],
        None => entity_path,
    }
}

impl Corpus {
    /// Fold `candidate` into `id` and forward the result up the owner chain.
    ///
    /// `None` is a no-op. Propagation stops at the root or at the first node
    /// without the file-status capability; only the ancestors of `id` are
    /// touched.
    pub fn report_most_recent_time(&mut self, id: NodeId, candidate: Option<DateTime<Utc>>) -> Result<()> {
        let Some(mut time) = candidate else {
            return Ok(());
        };

        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node_mut(node_id)?;
            let owner = node.owner();
            let Some(status) = node.as_file_status_mut() else {
                break;
            };
            time = status.absorb_reported_time(time);
            tracing::trace!(node = %node_id, time = %time, "absorbed reported modification time");
            current = owner;
        }
        Ok(())
    }

    /// Refresh the file status of `id` and everything it contains.
    ///
    /// Storage failures are logged and treated as "no new information";
    /// existing times are left as they were.
    pub async fn file_status_check(&mut self, id: NodeId) -> Result<()> {
        match self.node(id)?.object_type() {
            ObjectType::DataPartitionDef => self.check_partition(id).await,
            ObjectType::LocalEntityDeclarationDef => self.check_local_entity_declaration(id).await,
            ObjectType::ManifestDeclarationDef => self.check_manifest_declaration(id).await,
            ObjectType::ManifestDef => self.check_manifest(id).await,
            object_type => Err(ModelError::MissingCapability {
                id,
                object_type,
                capability: "file status",
            }),
        }
    }

    async fn fetch_modified_time(&self, id: NodeId, path: &str) -> Option<DateTime<Utc>> {
        let relative_to = self.document_path(id);
        let ctx = self.context();
        let full_path = ctx
            .storage
            .create_absolute_corpus_path(path, relative_to.as_deref())?;
        match ctx.storage.compute_last_modified_time(&full_path).await {
            Ok(time) => time,
            Err(err) => {
                tracing::warn!(
                    node = %id,
                    path = %full_path,
                    error = %err,
                    "could not fetch last modified time"
                );
                None
            }
        }
    }

    /// Record a completed check on a node with the capability and return its
    /// (never regressing) modified time.
    fn record_check(&mut self, id: NodeId, observed: Option<DateTime<Utc>>) -> Result<Option<DateTime<Utc>>> {
        let now = self.context().now();
        let node = self.node_mut(id)?;
        let object_type = node.object_type();
        let status = node.as_file_status_mut().ok_or(ModelError::MissingCapability {
            id,
            object_type,
            capability: "file status",
        })?;
        status.set_last_file_status_check_time(Some(now));
        let latest = max_time(observed, status.last_file_modified_time());
        status.set_last_file_modified_time(latest);
        Ok(latest)
    }

    async fn check_partition(&mut self, id: NodeId) -> Result<()> {
        let location = self.partition(id)?.location.clone();
        let observed = match location.as_deref().filter(|l| !l.is_empty()) {
            Some(location) => self.fetch_modified_time(id, location).await,
            None => {
                tracing::warn!(
                    node = %id,
                    partition = %self.partition(id)?.name,
                    "data partition has no location; nothing to check"
                );
                None
            }
        };
        let latest = self.record_check(id, observed)?;
        self.report_most_recent_time(id, latest)
    }

    async fn check_local_entity_declaration(&mut self, id: NodeId) -> Result<()> {
        let declaration = self.local_entity_declaration(id)?;
        let entity_path = declaration.entity_path.clone();
        let partitions = declaration.data_partitions.clone();

        let observed = match entity_path.as_deref() {
            Some(path) => self.fetch_modified_time(id, document_part(path)).await,
            None => None,
        };
        for partition in partitions {
            self.check_partition(partition).await?;
        }
        let latest = self.record_check(id, observed)?;
        self.report_most_recent_time(id, latest)
    }

    async fn check_manifest_declaration(&mut self, id: NodeId) -> Result<()> {
        let definition = self.manifest_declaration(id)?.definition.clone();
        let observed = self.fetch_modified_time(id, &definition).await;
        let latest = self.record_check(id, observed)?;
        self.report_most_recent_time(id, latest)
    }

    async fn check_manifest(&mut self, id: NodeId) -> Result<()> {
        let manifest = self.manifest(id)?;
        let own_path = manifest.document.corpus_path();
        let entities = manifest.entities.clone();
        let sub_manifests = manifest.sub_manifests.clone();

        let observed = self.fetch_modified_time(id, &own_path).await;
        for entity in entities {
            if self.node(entity)?.object_type() == ObjectType::LocalEntityDeclarationDef {
                self.check_local_entity_declaration(entity).await?;
            }
        }
        for sub_manifest in sub_manifests {
            self.check_manifest_declaration(sub_manifest).await?;
        }

        let latest = self.record_check(id, observed)?;
        let manifest = self.manifest(id)?;
        let most_recent = max_time(latest, manifest.last_child_file_modified_time);
        if let Some(owner) = self.node(id)?.owner() {
            self.report_most_recent_time(owner, most_recent)?;
        }
        Ok(())
    }
}
