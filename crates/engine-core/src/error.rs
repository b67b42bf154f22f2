use thiserror::Error;

/// Failures of the durable run-state store. These are fatal: without a
/// trustworthy checkpoint the cursor/commit pairing cannot be maintained.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("State store error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Failed to load checkpoint: {0}")]
    CheckpointLoad(String),

    #[error("Failed to save checkpoint: {0}")]
    CheckpointSave(String),

    #[error("Checkpoint serialization failed: {0}")]
    Serialization(#[from] bincode::Error),
}
