//! One full pass over the trace: line count, min and max timestamp.

use crate::error::TlexError;
use crate::record::{Ts, line_ts};
use crate::utils::progress::ProgressBar;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Bytes re-read from the end of the trace when locating `max_ts`.
///
/// The scan assumes the true maximum timestamp occurs within this tail.
/// A writer that flushes a late-arriving but larger timestamp earlier than
/// the final tail under-reports `max_ts`; this is a documented limitation,
/// not a guarantee against out-of-order trailing writes.
pub const TAIL_SCAN_BYTES: u64 = 100_000;

/// Read size for the newline-counting pass; peak memory stays O(chunk).
const CHUNK_BYTES: usize = 65_536;

/// Statistics from a single scanning pass. Deterministic for an unchanged
/// file: two scans yield identical values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceStats {
    pub line_count: u64,
    pub min_ts: Ts,
    pub max_ts: Ts,
}

/// Scan the trace at `path`, whose size was observed as `file_size` at
/// session start.
pub fn scan(path: &Path, file_size: u64, progress: Option<&ProgressBar>) -> Result<TraceStats> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader = BufReader::with_capacity(CHUNK_BYTES, file);

    let min_ts = find_min_ts(&mut reader)?;

    reader.seek(SeekFrom::Start(0))?;
    let line_count = count_lines(&mut reader, progress)?;

    let max_ts = find_max_ts(&mut reader, file_size, min_ts)?;

    Ok(TraceStats {
        line_count,
        min_ts,
        max_ts,
    })
}

/// Forward scan from the start until the first line that parses into an
/// object carrying `ts`. Malformed and header lines are skipped.
fn find_min_ts<R: BufRead>(reader: &mut R) -> Result<Ts> {
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Err(TlexError::NoTimestampedRecords.into());
        }
        if let Some(ts) = line_ts(&line) {
            return Ok(ts);
        }
    }
}

/// Count line separators in fixed-size chunks; the file is never
/// materialized as a whole or line by line.
fn count_lines<R: Read>(reader: &mut R, progress: Option<&ProgressBar>) -> Result<u64> {
    let mut buf = vec![0u8; CHUNK_BYTES];
    let mut count = 0u64;
    let mut pos = 0u64;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        count += memchr::memchr_iter(b'\n', &buf[..n]).count() as u64;
        pos += n as u64;
        if let Some(bar) = progress {
            bar.set_position(pos);
        }
    }
    Ok(count)
}

/// Seek near the end, drop the truncated first line, and take the maximum
/// `ts` over the remaining tail. Falls back to `min_ts` when the tail has
/// no parseable timestamps.
fn find_max_ts<R: BufRead + Seek>(reader: &mut R, file_size: u64, min_ts: Ts) -> Result<Ts> {
    let tail_start = file_size.saturating_sub(TAIL_SCAN_BYTES);
    reader.seek(SeekFrom::Start(tail_start))?;

    let mut line = Vec::new();
    if tail_start > 0 {
        // The seek landed mid-record; the first line is truncated.
        reader.read_until(b'\n', &mut line)?;
    }

    let mut max_ts = min_ts;
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        if let Some(ts) = line_ts(&line) {
            max_ts = max_ts.max(ts);
        }
    }
    Ok(max_ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_trace(metadata_lines: usize, records: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[").unwrap();
        for i in 0..metadata_lines {
            writeln!(file, "{{\"name\": \"meta_{i}\", \"ph\": \"M\"}},").unwrap();
        }
        for i in 0..records {
            writeln!(file, "{{\"ts\": {}, \"name\": \"op_{}\"}},", i * 1000, i).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_scan_counts_and_bounds() {
        let trace = write_trace(5, 1000);
        let size = trace.path().metadata().unwrap().len();
        let stats = scan(trace.path(), size, None).unwrap();

        // "[", 5 metadata lines, 1000 records, all newline-terminated.
        assert_eq!(stats.line_count, 1006);
        assert_eq!(stats.min_ts, 0);
        assert_eq!(stats.max_ts, 999_000);
    }

    #[test]
    fn test_scan_is_deterministic() {
        let trace = write_trace(2, 500);
        let size = trace.path().metadata().unwrap().len();
        let first = scan(trace.path(), size, None).unwrap();
        let second = scan(trace.path(), size, None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_min_ts_skips_malformed_head() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json at all").unwrap();
        writeln!(file, "{{\"name\": \"meta\"}}").unwrap();
        writeln!(file, "{{\"ts\": 42, \"name\": \"first\"}}").unwrap();
        writeln!(file, "{{\"ts\": 99, \"name\": \"second\"}}").unwrap();
        file.flush().unwrap();

        let size = file.path().metadata().unwrap().len();
        let stats = scan(file.path(), size, None).unwrap();
        assert_eq!(stats.min_ts, 42);
        assert_eq!(stats.max_ts, 99);
        assert_eq!(stats.line_count, 4);
    }

    #[test]
    fn test_no_timestamped_records_is_fatal() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{\"name\": \"meta\"}}").unwrap();
        file.flush().unwrap();

        let size = file.path().metadata().unwrap().len();
        let err = scan(file.path(), size, None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TlexError>(),
            Some(TlexError::NoTimestampedRecords)
        ));
    }

    #[test]
    fn test_tail_smaller_than_file() {
        // Over 100 KB of records so the tail seek skips the head entirely.
        let trace = write_trace(0, 5000);
        let size = trace.path().metadata().unwrap().len();
        assert!(size > TAIL_SCAN_BYTES);

        let stats = scan(trace.path(), size, None).unwrap();
        assert_eq!(stats.min_ts, 0);
        assert_eq!(stats.max_ts, 4_999_000);
    }
}
