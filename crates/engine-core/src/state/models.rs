use chrono::{DateTime, Utc};
use model::pagination::cursor::Cursor;
use serde::{Deserialize, Serialize};

/// How far the current batch has progressed.
///
/// `Read` means the window has been fetched but its results are not durable
/// yet; a crash there resumes from the previous committed cursor. Only
/// `Committed` moves the resumable position forward.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckpointStage {
    Read,
    Committed,
}

impl CheckpointStage {
    pub fn rank(&self) -> u8 {
        match self {
            CheckpointStage::Read => 1,
            CheckpointStage::Committed => 2,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Checkpoint {
    pub run_id: String,
    pub table: String,
    pub stage: CheckpointStage,
    /// Resume-from cursor. For `Read` this is the cursor the batch started
    /// at; for `Committed` it is the cursor past the batch.
    pub cursor: Cursor,
    pub batch_id: String,
    pub rows_done: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub updated_at: DateTime<Utc>,
}
