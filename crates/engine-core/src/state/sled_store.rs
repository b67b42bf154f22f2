use crate::{
    error::StateError,
    state::{
        StateStore,
        models::{Checkpoint, CheckpointStage},
    },
};
use async_trait::async_trait;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use std::path::Path;

pub struct SledStateStore {
    db: sled::Db,
}

impl SledStateStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StateError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    #[inline]
    fn chk_key(table: &str) -> String {
        format!("chk:{table}")
    }
}

#[async_trait]
impl StateStore for SledStateStore {
    async fn save_checkpoint(&self, cp: &Checkpoint) -> Result<(), StateError> {
        let key = Self::chk_key(&cp.table);
        let new_bytes = bincode::serialize(cp)?;

        // Atomic check-then-set so a stale writer can never move the cursor
        // backwards: within a run, a batch only moves forward in stage and a
        // new batch may only replace a fully committed one. A different run
        // always takes over; runs never execute concurrently, so a leftover
        // uncommitted checkpoint belongs to an aborted run.
        let result = self.db.transaction::<_, (), StateError>(|tx| {
            if let Some(existing_bytes) = tx.get(&key)? {
                let existing: Checkpoint = bincode::deserialize(&existing_bytes)
                    .map_err(|e| ConflictableTransactionError::Abort(StateError::from(e)))?;

                let should_update = if existing.run_id != cp.run_id {
                    true
                } else if existing.batch_id == cp.batch_id {
                    cp.stage.rank() >= existing.stage.rank()
                } else {
                    existing.stage == CheckpointStage::Committed
                };

                if !should_update {
                    // Stale update, intentionally skipped.
                    return Ok(());
                }
            }

            tx.insert(key.as_bytes(), new_bytes.as_slice())?;
            Ok(())
        });

        match result {
            Ok(()) => Ok(()),
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(StateError::Storage(e)),
        }
    }

    async fn load_checkpoint(&self, table: &str) -> Result<Option<Checkpoint>, StateError> {
        let key = Self::chk_key(table);
        match self
            .db
            .get(key)
            .map_err(|e| StateError::CheckpointLoad(e.to_string()))?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }
}
