use crate::{pagination::cursor::Cursor, records::address::RawAddressRecord};

/// A bounded, ordered slice of the source table. The unit of commit: the
/// normalized results of one batch are persisted together or not at all.
#[derive(Debug, Clone)]
pub struct Batch {
    pub id: String,
    pub records: Vec<RawAddressRecord>,
    /// Cursor this batch was read from (last committed position).
    pub cursor: Cursor,
    /// Resume-from cursor once this batch commits.
    pub next: Cursor,
}

impl Batch {
    pub fn new(seq: u64, records: Vec<RawAddressRecord>, cursor: Cursor) -> Self {
        // The resume cursor is derived from the batch content itself so that
        // retries of the same read window always produce the same pairing.
        let next = records
            .last()
            .map(|r| Cursor::after(r.key))
            .unwrap_or_else(|| cursor.clone());

        Self {
            id: format!("batch-{seq}"),
            records,
            cursor,
            next,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_cursor_points_past_the_last_record() {
        let records = vec![
            RawAddressRecord::new(10, "10 First Ave"),
            RawAddressRecord::new(11, "11 First Ave"),
        ];
        let batch = Batch::new(3, records, Cursor::after(9));

        assert_eq!(batch.id, "batch-3");
        assert_eq!(batch.cursor, Cursor::after(9));
        assert_eq!(batch.next, Cursor::after(11));
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn empty_batch_keeps_its_cursor() {
        let batch = Batch::new(0, Vec::new(), Cursor::None);
        assert!(batch.is_empty());
        assert_eq!(batch.next, Cursor::None);
    }
}
