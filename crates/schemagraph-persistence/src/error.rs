use schemagraph_model::ModelError;
use schemagraph_storage::StorageError;

/// Failures while converting between JSON and the object model.
///
/// Unrecognised shapes are not errors; the dispatcher reports them as `None`.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("'{path}' is not a {expected}")]
    NotA { path: String, expected: &'static str },
}

pub type Result<T> = std::result::Result<T, PersistenceError>;
