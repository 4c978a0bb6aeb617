use pagecraft_engine::{EngineError, PathError};
use thiserror::Error;

pub type EditorResult<T> = Result<T, EditorError>;

pub type PersistResult<T> = Result<T, PersistError>;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Page '{id}' not found")]
    UnknownPage { id: String },

    #[error("Component instance '{id}' not found")]
    UnknownInstance { id: String },

    #[error("Invalid reorder: {reason}")]
    InvalidReorder { reason: String },

    #[error("Index {index} out of bounds (length {len})")]
    OutOfBounds { index: usize, len: usize },

    #[error("No editor is open")]
    NoOpenEditor,

    #[error("'{field}' is a styling field; edit it through the style editor")]
    ReservedField { field: String },

    #[error("Nothing to confirm: no delete is pending")]
    NoPendingDelete,

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Project '{project_id}' not found")]
    NotFound { project_id: String },

    #[error("Invalid project id '{project_id}'")]
    InvalidProjectId { project_id: String },

    #[error("Persist worker is no longer running")]
    WorkerStopped,
}
