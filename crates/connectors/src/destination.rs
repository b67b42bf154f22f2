use crate::error::DbError;
use async_trait::async_trait;
use model::records::address::NormalizedAddress;

/// Persists normalized addresses. `write_batch` is atomic: either every row
/// of the batch becomes durable or none does, so the stored data always
/// pairs up with a committed cursor position.
#[async_trait]
pub trait AddressDestination: Send + Sync {
    async fn write_batch(&self, batch_id: &str, rows: &[NormalizedAddress])
    -> Result<(), DbError>;
}
