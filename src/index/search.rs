//! Bracketing lookups over a sparse time index.

use super::TimeIndex;
use crate::error::TlexError;
use crate::record::Ts;

/// Maps a query timestamp to the byte range that must contain it.
///
/// Borrows the index together with the trace bounds it was built against;
/// the three must come from the same summary or brackets are meaningless.
pub struct IndexSearcher<'a> {
    index: &'a TimeIndex,
    min_ts: Ts,
    max_ts: Ts,
    file_size: u64,
}

impl<'a> IndexSearcher<'a> {
    pub fn new(index: &'a TimeIndex, min_ts: Ts, max_ts: Ts, file_size: u64) -> Self {
        Self {
            index,
            min_ts,
            max_ts,
            file_size,
        }
    }

    /// Byte bracket `(lower, upper)` guaranteed to contain every record at
    /// timestamp `ts`.
    ///
    /// Timestamps at or below `min_ts` collapse to `(0, 0)`; at or above
    /// `max_ts` they collapse to `(file_size, file_size)`. In between, the
    /// bracket spans the adjacent pair of index entries around `ts`, with
    /// an implicit leading entry at offset zero. Failing to find a bracket
    /// for an in-range timestamp means the index does not match the trace.
    pub fn search(&self, ts: Ts) -> Result<(u64, u64), TlexError> {
        if ts <= self.min_ts {
            return Ok((0, 0));
        }
        if ts >= self.max_ts {
            return Ok((self.file_size, self.file_size));
        }

        let i = self.index.partition_point(|entry| entry.ts < ts);
        if i == self.index.len() {
            return Err(TlexError::IndexConsistency { ts });
        }
        let lower = if i == 0 { 0 } else { self.index[i - 1].offset };
        Ok((lower, self.index[i].offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexEntry;

    fn entry(ts: Ts, offset: u64) -> IndexEntry {
        IndexEntry { ts, offset }
    }

    #[test]
    fn test_boundary_collapses() {
        let index = vec![entry(100, 10), entry(200, 20)];
        let searcher = IndexSearcher::new(&index, 50, 500, 1000);

        assert_eq!(searcher.search(50).unwrap(), (0, 0));
        assert_eq!(searcher.search(-10).unwrap(), (0, 0));
        assert_eq!(searcher.search(500).unwrap(), (1000, 1000));
        assert_eq!(searcher.search(9999).unwrap(), (1000, 1000));
    }

    #[test]
    fn test_bracket_between_entries() {
        let index = vec![entry(100, 10), entry(200, 20), entry(300, 30)];
        let searcher = IndexSearcher::new(&index, 0, 1000, 1000);

        // Below the first entry the implicit lower bound is offset zero.
        assert_eq!(searcher.search(50).unwrap(), (0, 10));
        assert_eq!(searcher.search(150).unwrap(), (10, 20));
        assert_eq!(searcher.search(250).unwrap(), (20, 30));
    }

    #[test]
    fn test_exact_entry_hit_brackets_from_below() {
        // A query equal to a sampled timestamp must use that entry as the
        // upper bound: the sampled record itself lies before its offset.
        let index = vec![entry(100, 10), entry(200, 20)];
        let searcher = IndexSearcher::new(&index, 0, 1000, 1000);
        assert_eq!(searcher.search(200).unwrap(), (10, 20));
    }

    #[test]
    fn test_bracket_ordering_over_range() {
        let index: TimeIndex = (1..10).map(|i| entry(i * 100, (i * 10) as u64)).collect();
        let searcher = IndexSearcher::new(&index, 0, 1000, 1000);
        for ts in 1..900 {
            let (lo, hi) = searcher.search(ts).unwrap();
            assert!(lo <= hi, "lo > hi at ts {ts}");
        }
    }

    #[test]
    fn test_unbracketable_timestamp_is_inconsistency() {
        let index = vec![entry(100, 10)];
        let searcher = IndexSearcher::new(&index, 0, 1000, 1000);
        assert!(matches!(
            searcher.search(400),
            Err(TlexError::IndexConsistency { ts: 400 })
        ));
    }
}
