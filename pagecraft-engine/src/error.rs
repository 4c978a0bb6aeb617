use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Unknown component definition '{id}'")]
    UnknownDefinition { id: String },

    #[error("Duplicate component definition id '{id}'")]
    DuplicateDefinition { id: String },

    #[error(transparent)]
    Path(#[from] PathError),
}

/// Position inside component source text (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompileErrorKind {
    /// Source could not be parsed (unbalanced braces, unexpected tokens, ...)
    Syntax,
    /// Zero or several plausible entry functions after filtering helpers
    EntryNotFound,
    /// The entry function threw while rendering
    Execution,
    /// The entry function returned something that is not a renderable node
    InvalidOutput,
    /// Step budget or call depth exhausted
    BudgetExceeded,
}

/// A recoverable compilation or render failure.
///
/// Always carries the offending source so the canvas can show it in the
/// diagnostic card.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
#[serde(rename_all = "camelCase")]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub message: String,
    pub source_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, message: impl Into<String>, source_text: &str) -> Self {
        Self {
            kind,
            message: message.into(),
            source_text: source_text.to_string(),
            location: None,
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Human-readable message including the location when known.
    pub fn describe(&self) -> String {
        match self.location {
            Some(loc) => format!("{} (line {}, column {})", self.message, loc.line, loc.column),
            None => self.message.clone(),
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("Empty prop path")]
    Empty,

    #[error("Prop '{name}' not found")]
    UnknownProp { name: String },

    #[error("Path '{path}' does not resolve: {reason}")]
    Unresolved { path: String, reason: String },

    #[error("Index {index} out of bounds for '{path}' (length {len})")]
    OutOfBounds { path: String, index: usize, len: usize },
}
