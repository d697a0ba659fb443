//! Sparse index construction: stride across the trace, resynchronize on a
//! line boundary, sample one record per step.

use super::{IndexEntry, TimeIndex};
use crate::record::line_ts;
use crate::utils::progress::ProgressBar;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Upper bound on a single skip read. Very large strides are walked in
/// sub-steps of this size so no read materializes more than this much.
pub const MAX_STEP_BYTES: u64 = 65_536;

/// Build a fresh index over the whole trace.
///
/// Entries are monotonic by construction on a monotonic trace; their
/// spacing approximates `bytes_per_entry` but is not exact, since each
/// step lands mid-line and resynchronizes forward.
pub fn build(
    path: &Path,
    bytes_per_entry: u64,
    progress: Option<&ProgressBar>,
) -> Result<TimeIndex> {
    extend(path, bytes_per_entry, 0, TimeIndex::new(), progress)
}

/// Resume construction from `start_offset`, appending to `index`.
///
/// Used when a live trace has grown: walking from the last indexed offset
/// leaves the previously-built prefix byte-identical.
pub fn extend(
    path: &Path,
    bytes_per_entry: u64,
    start_offset: u64,
    mut index: TimeIndex,
    progress: Option<&ProgressBar>,
) -> Result<TimeIndex> {
    let stride = bytes_per_entry.max(1);
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader = BufReader::with_capacity(MAX_STEP_BYTES as usize, file);
    let mut pos = start_offset;
    if pos > 0 {
        reader.seek(SeekFrom::Start(pos))?;
    }

    let mut line = Vec::new();
    loop {
        if !skip_stride(&mut reader, stride, &mut pos)? {
            break;
        }

        // The stride almost certainly landed mid-record; discard through
        // the next newline to resynchronize on a line boundary.
        line.clear();
        let n = reader.read_until(b'\n', &mut line)? as u64;
        if n == 0 {
            break;
        }
        pos += n;

        // The following full line is the sample.
        line.clear();
        let n = reader.read_until(b'\n', &mut line)? as u64;
        if n == 0 {
            break;
        }
        pos += n;

        if let Some(ts) = line_ts(&line) {
            index.push(IndexEntry { ts, offset: pos });
        }
        if let Some(bar) = progress {
            bar.set_position(pos);
        }
    }

    Ok(index)
}

/// Advance `stride` bytes in capped sub-steps. Returns false once the
/// stride runs past EOF.
fn skip_stride<R: Read>(reader: &mut R, stride: u64, pos: &mut u64) -> io::Result<bool> {
    let mut remaining = stride;
    while remaining > 0 {
        let step = remaining.min(MAX_STEP_BYTES);
        let skipped = io::copy(&mut reader.by_ref().take(step), &mut io::sink())?;
        *pos += skipped;
        if skipped < step {
            return Ok(false);
        }
        remaining -= step;
    }
    Ok(true)
}
