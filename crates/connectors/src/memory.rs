//! In-memory source and destination used by the runner and executor tests.
//! Both support scripted failure injection so fatal paths can be exercised
//! without a live database.

use crate::{destination::AddressDestination, error::DbError, source::AddressSource};
use async_trait::async_trait;
use model::{
    pagination::{cursor::Cursor, page::FetchResult},
    records::address::{NormalizedAddress, RawAddressRecord},
};
use std::sync::Mutex;

pub struct MemoryAddressSource {
    rows: Vec<RawAddressRecord>,
    /// Number of upcoming fetches that fail with `Unavailable`.
    failing_fetches: Mutex<u32>,
}

impl MemoryAddressSource {
    pub fn new(mut rows: Vec<RawAddressRecord>) -> Self {
        rows.sort_by_key(|r| r.key);
        Self {
            rows,
            failing_fetches: Mutex::new(0),
        }
    }

    /// Make the next `count` fetches fail before any rows are returned.
    pub fn fail_next_fetches(&self, count: u32) {
        *self.failing_fetches.lock().unwrap() = count;
    }
}

#[async_trait]
impl AddressSource for MemoryAddressSource {
    async fn fetch(&self, batch_size: usize, cursor: Cursor) -> Result<FetchResult, DbError> {
        {
            let mut failing = self.failing_fetches.lock().unwrap();
            if *failing > 0 {
                *failing -= 1;
                return Err(DbError::Unavailable("connection refused".into()));
            }
        }

        let lower = cursor.lower_bound();
        let records: Vec<RawAddressRecord> = self
            .rows
            .iter()
            .filter(|r| r.key > lower)
            .take(batch_size)
            .cloned()
            .collect();

        let row_count = records.len();
        let reached_end = row_count < batch_size;
        let next_cursor = if reached_end {
            None
        } else {
            records.last().map(|r| Cursor::after(r.key))
        };

        Ok(FetchResult {
            records,
            next_cursor,
            reached_end,
            row_count,
            took_ms: 0,
        })
    }
}

#[derive(Default)]
pub struct MemoryAddressDestination {
    written: Mutex<Vec<NormalizedAddress>>,
    committed_batches: Mutex<usize>,
    /// Zero-based index of the batch whose commit should fail, persistently.
    fail_on_batch: Option<usize>,
}

impl MemoryAddressDestination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on_batch(index: usize) -> Self {
        Self {
            fail_on_batch: Some(index),
            ..Self::default()
        }
    }

    pub fn written(&self) -> Vec<NormalizedAddress> {
        self.written.lock().unwrap().clone()
    }

    pub fn committed_batches(&self) -> usize {
        *self.committed_batches.lock().unwrap()
    }
}

#[async_trait]
impl AddressDestination for MemoryAddressDestination {
    async fn write_batch(
        &self,
        batch_id: &str,
        rows: &[NormalizedAddress],
    ) -> Result<(), DbError> {
        let mut committed = self.committed_batches.lock().unwrap();
        if self.fail_on_batch == Some(*committed) {
            return Err(DbError::Commit {
                batch_id: batch_id.to_string(),
                message: "simulated commit failure".into(),
            });
        }

        // All rows land or none do, mirroring the transactional contract.
        self.written.lock().unwrap().extend_from_slice(rows);
        *committed += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(keys: &[i64]) -> Vec<RawAddressRecord> {
        keys.iter()
            .map(|k| RawAddressRecord::new(*k, format!("{k} Main St")))
            .collect()
    }

    #[tokio::test]
    async fn fetch_pages_through_in_key_order() {
        let source = MemoryAddressSource::new(rows(&[3, 1, 2, 5, 4]));

        let first = source.fetch(2, Cursor::None).await.unwrap();
        assert_eq!(
            first.records.iter().map(|r| r.key).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert!(!first.reached_end);

        let second = source.fetch(2, first.next_cursor.unwrap()).await.unwrap();
        assert_eq!(
            second.records.iter().map(|r| r.key).collect::<Vec<_>>(),
            vec![3, 4]
        );

        let third = source.fetch(2, second.next_cursor.unwrap()).await.unwrap();
        assert_eq!(third.row_count, 1);
        assert!(third.reached_end);
        assert!(third.next_cursor.is_none());
    }

    #[tokio::test]
    async fn scripted_fetch_failures_then_recovery() {
        let source = MemoryAddressSource::new(rows(&[1]));
        source.fail_next_fetches(1);

        assert!(matches!(
            source.fetch(10, Cursor::None).await,
            Err(DbError::Unavailable(_))
        ));
        assert_eq!(source.fetch(10, Cursor::None).await.unwrap().row_count, 1);
    }

    #[tokio::test]
    async fn destination_fails_the_scripted_batch_persistently() {
        let dest = MemoryAddressDestination::failing_on_batch(0);
        let err = dest.write_batch("batch-0", &[]).await;
        // Empty batches short-circuit nothing here; the fake fails by index.
        assert!(err.is_err());
        assert!(dest.write_batch("batch-0", &[]).await.is_err());
        assert_eq!(dest.committed_batches(), 0);
    }
}
