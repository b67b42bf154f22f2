use crate::normalize::NormalizeError;
use connectors::error::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutorError {
    /// Catastrophic normalizer failure (not a parse failure). Aborts the run.
    #[error(transparent)]
    Normalization(#[from] NormalizeError),

    /// The batch commit failed after retries. Aborts the run; the batch must
    /// be re-run from the same cursor position.
    #[error("Failed to commit batch '{batch_id}': {source}")]
    Commit {
        batch_id: String,
        #[source]
        source: DbError,
    },

    /// A normalization worker panicked or was cancelled.
    #[error("Normalization worker failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to write failure report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize failure report row: {0}")]
    Csv(#[from] csv::Error),
}
