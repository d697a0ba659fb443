use crate::record::Ts;
use thiserror::Error;

/// Fatal failures surfaced by the extraction engine.
///
/// Per-line parse failures are deliberately not represented here; a line
/// that fails to decode becomes a [`crate::record::SkipReason`] and is
/// skipped by every scanner.
#[derive(Debug, Error)]
pub enum TlexError {
    /// Invalid or conflicting configuration. Caller-facing, aborts the command.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// `search()` could not bracket a timestamp the summary claims lies
    /// inside `[min_ts, max_ts]`. Signals a corrupted index or an index
    /// built against a different version of the trace.
    #[error("index inconsistency: no bracket found for timestamp {ts} us")]
    IndexConsistency { ts: Ts },

    /// The trace contains no record with a numeric `ts` field, so no
    /// statistics or index can be derived from it.
    #[error("trace contains no timestamped records")]
    NoTimestampedRecords,
}

/// First structural invariant violated by a time index, with the offending
/// entry position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IndexViolation {
    #[error("out-of-order timestamp at index entry {0}")]
    TimestampOrder(usize),
    #[error("out-of-order byte offset at index entry {0}")]
    OffsetOrder(usize),
    #[error("timestamp outside [min_ts, max_ts] at index entry {0}")]
    TimestampRange(usize),
    #[error("byte offset outside [0, file_size] at index entry {0}")]
    OffsetRange(usize),
}
