pub mod models;
pub mod sled_store;

use crate::error::StateError;
use async_trait::async_trait;
use models::Checkpoint;

/// Durable store for run progress. One checkpoint is kept per source table;
/// it records the last batch, its stage, and the cursor to resume from.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn save_checkpoint(&self, cp: &Checkpoint) -> Result<(), StateError>;

    async fn load_checkpoint(&self, table: &str) -> Result<Option<Checkpoint>, StateError>;
}
