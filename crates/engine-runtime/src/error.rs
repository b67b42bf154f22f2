use crate::config::ConfigError;
use engine_core::error::StateError;
use engine_processing::error::{ExecutorError, SinkError};
use model::pagination::cursor::Cursor;
use thiserror::Error;

/// Fatal run-level errors. Per-record normalization failures never appear
/// here; they are recovered into failure records and reported.
#[derive(Error, Debug)]
pub enum RunError {
    /// Rejected before anything was read.
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    /// The source could not be read, even after retries. Resumable from the
    /// last committed cursor.
    #[error("Source unavailable at {cursor}: {message}")]
    SourceUnavailable { cursor: Cursor, message: String },

    /// A batch commit failed; nothing of that batch was persisted.
    #[error("Batch persistence failed for '{batch_id}': {message}")]
    Persistence { batch_id: String, message: String },

    /// The normalizer hit a catastrophic condition (not a parse failure).
    #[error("Normalization aborted: {0}")]
    Normalization(String),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("Failure report error: {0}")]
    Report(#[from] SinkError),

    /// Graceful shutdown observed between batches.
    #[error("Run cancelled before completion")]
    Cancelled,
}

impl RunError {
    /// Short category name for reports and logs.
    pub fn category(&self) -> &'static str {
        match self {
            RunError::Configuration(_) => "configuration",
            RunError::SourceUnavailable { .. } => "source_unavailable",
            RunError::Persistence { .. } => "persistence",
            RunError::Normalization(_) => "normalization",
            RunError::State(_) => "state",
            RunError::Report(_) => "report",
            RunError::Cancelled => "cancelled",
        }
    }
}

impl From<ExecutorError> for RunError {
    fn from(err: ExecutorError) -> Self {
        match err {
            ExecutorError::Commit { batch_id, source } => RunError::Persistence {
                batch_id,
                message: source.to_string(),
            },
            other => RunError::Normalization(other.to_string()),
        }
    }
}
