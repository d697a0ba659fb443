//! Sparse time index: an approximate, monotonic timestamp-to-byte-offset
//! mapping sampled at byte intervals. It bounds window scans without
//! storing every record's position.

pub mod build;
pub mod search;
pub mod validate;

pub use search::IndexSearcher;

use crate::record::Ts;
use serde::{Deserialize, Serialize};

/// One index sample. Persisted as a `[timestamp, byte_offset]` pair.
///
/// `offset` is the position just past the sampled record, so consecutive
/// entries bracket every record between their sample points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(Ts, u64)", into = "(Ts, u64)")]
pub struct IndexEntry {
    pub ts: Ts,
    pub offset: u64,
}

impl From<(Ts, u64)> for IndexEntry {
    fn from((ts, offset): (Ts, u64)) -> Self {
        Self { ts, offset }
    }
}

impl From<IndexEntry> for (Ts, u64) {
    fn from(entry: IndexEntry) -> Self {
        (entry.ts, entry.offset)
    }
}

/// Index entries, non-decreasing in both timestamp and byte offset.
pub type TimeIndex = Vec<IndexEntry>;

/// Mean time between index entries, in microseconds.
pub fn mean_entry_gap(index: &TimeIndex) -> Option<f64> {
    let (first, last) = (index.first()?, index.last()?);
    if index.len() < 2 {
        return None;
    }
    Some((last.ts - first.ts) as f64 / (index.len() - 1) as f64)
}
