use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// The connection could not be obtained or was lost. Transient from the
    /// retry policy's point of view; fatal to the run once retries are spent.
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// A row came back in a shape we cannot map onto the record type. Not
    /// retryable: the same row will decode the same way every time.
    #[error("Failed to decode row with key {key}: {message}")]
    Decode { key: i64, message: String },

    #[error("Batch commit failed for '{batch_id}': {message}")]
    Commit { batch_id: String, message: String },
}

impl DbError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, DbError::Decode { .. })
    }
}
