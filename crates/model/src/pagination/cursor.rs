use serde::{Deserialize, Serialize};

/// Position within the source address table.
///
/// The source table is read in strictly ascending primary-key order, so the
/// cursor is the last key that has been handed out. A batch commit pairs the
/// written rows with the cursor that follows them, which is what makes an
/// interrupted run resumable without skips or repeats.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// Start of the table, nothing read yet.
    None,

    /// Keyset position: all records with `address_key <= last_key` have been
    /// handed out.
    Key { last_key: i64 },
}

impl Cursor {
    pub fn after(key: i64) -> Self {
        Cursor::Key { last_key: key }
    }

    /// The exclusive lower bound for the next read. `None` cursor reads from
    /// the beginning, which for an i64 key means everything above i64::MIN.
    pub fn lower_bound(&self) -> i64 {
        match self {
            Cursor::None => i64::MIN,
            Cursor::Key { last_key } => *last_key,
        }
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cursor::None => write!(f, "start"),
            Cursor::Key { last_key } => write!(f, "after key {last_key}"),
        }
    }
}
