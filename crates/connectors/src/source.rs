use crate::error::DbError;
use async_trait::async_trait;
use model::pagination::{cursor::Cursor, page::FetchResult};

/// Reads the source address table in bounded, key-ordered windows.
///
/// Implementations must guarantee that, for a fixed table, repeating a fetch
/// with the same cursor returns the same window: the cursor is the only read
/// state, so a retried or resumed read never skips or repeats records.
#[async_trait]
pub trait AddressSource: Send + Sync {
    async fn fetch(&self, batch_size: usize, cursor: Cursor) -> Result<FetchResult, DbError>;
}
