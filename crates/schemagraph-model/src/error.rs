use crate::{NodeId, ObjectType};

/// Misuse of the object model API.
///
/// Shape mismatches, resolution misses and storage failures are not errors at
/// this level; they surface as `None` or are absorbed with a log line.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("node {0} does not exist in this corpus")]
    UnknownNode(NodeId),
    #[error("node {id} is a {found}, expected {expected}")]
    WrongKind {
        id: NodeId,
        expected: &'static str,
        found: ObjectType,
    },
    #[error("node {id} ({object_type}) does not support {capability}")]
    MissingCapability {
        id: NodeId,
        object_type: ObjectType,
        capability: &'static str,
    },
    #[error("host {host} ({found}) cannot receive a copy of a {expected}")]
    HostMismatch {
        host: NodeId,
        expected: ObjectType,
        found: ObjectType,
    },
    #[error("unknown trait-backed property '{0}'")]
    UnknownProperty(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
