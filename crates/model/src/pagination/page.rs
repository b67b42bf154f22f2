use crate::{pagination::cursor::Cursor, records::address::RawAddressRecord};

/// One page of raw records read from the source table.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub records: Vec<RawAddressRecord>,
    /// Cursor to resume from; `None` once the table is exhausted.
    pub next_cursor: Option<Cursor>,
    /// True when the read returned fewer rows than requested.
    pub reached_end: bool,
    pub row_count: usize,
    pub took_ms: u128,
}

impl FetchResult {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
