//! Offline structural validation of a time index.
//!
//! Checks the index invariants only; it does not cross-check entries
//! against the trace content, so a structurally valid index can still be
//! stale relative to a rewritten trace.

use super::TimeIndex;
use crate::error::IndexViolation;
use crate::record::Ts;

/// Check every entry, in order, for: monotonic timestamp, monotonic byte
/// offset, timestamp within `[min_ts, max_ts]`, offset within
/// `[0, file_size]`. Returns the first violation with its entry position.
pub fn validate(
    index: &TimeIndex,
    min_ts: Ts,
    max_ts: Ts,
    file_size: u64,
) -> Result<(), IndexViolation> {
    let mut prev: Option<&super::IndexEntry> = None;
    for (i, entry) in index.iter().enumerate() {
        if let Some(prev) = prev {
            if entry.ts < prev.ts {
                return Err(IndexViolation::TimestampOrder(i));
            }
            if entry.offset < prev.offset {
                return Err(IndexViolation::OffsetOrder(i));
            }
        }
        if entry.ts < min_ts || entry.ts > max_ts {
            return Err(IndexViolation::TimestampRange(i));
        }
        if entry.offset > file_size {
            return Err(IndexViolation::OffsetRange(i));
        }
        prev = Some(entry);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexEntry;

    fn entry(ts: Ts, offset: u64) -> IndexEntry {
        IndexEntry { ts, offset }
    }

    #[test]
    fn test_valid_index_passes() {
        let index = vec![entry(100, 10), entry(100, 20), entry(300, 30)];
        assert_eq!(validate(&index, 0, 1000, 100), Ok(()));
        assert_eq!(validate(&TimeIndex::new(), 0, 1000, 100), Ok(()));
    }

    #[test]
    fn test_out_of_order_timestamp() {
        let index = vec![entry(200, 10), entry(100, 20)];
        assert_eq!(
            validate(&index, 0, 1000, 100),
            Err(IndexViolation::TimestampOrder(1))
        );
    }

    #[test]
    fn test_out_of_order_offset() {
        let index = vec![entry(100, 20), entry(200, 10)];
        assert_eq!(
            validate(&index, 0, 1000, 100),
            Err(IndexViolation::OffsetOrder(1))
        );
    }

    #[test]
    fn test_timestamp_out_of_range() {
        let index = vec![entry(100, 10), entry(2000, 20)];
        assert_eq!(
            validate(&index, 0, 1000, 100),
            Err(IndexViolation::TimestampRange(1))
        );
        let index = vec![entry(-5, 10)];
        assert_eq!(
            validate(&index, 0, 1000, 100),
            Err(IndexViolation::TimestampRange(0))
        );
    }

    #[test]
    fn test_offset_out_of_range() {
        let index = vec![entry(100, 10), entry(200, 101)];
        assert_eq!(
            validate(&index, 0, 1000, 100),
            Err(IndexViolation::OffsetRange(1))
        );
    }

    #[test]
    fn test_order_violation_reported_before_range() {
        // An entry that is both out of order and out of range reports the
        // ordering violation first.
        let index = vec![entry(500, 50), entry(2000, 10)];
        assert_eq!(
            validate(&index, 0, 1000, 100),
            Err(IndexViolation::OffsetOrder(1))
        );
    }
}
