//! Discovery of metadata events: records without a `ts` field, assumed to
//! sit near the start of the trace.

use crate::record::{JsonMap, LineOutcome, event_ts, parse_line};
use crate::utils::progress::ProgressBar;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Lines scanned from the head before giving up on further metadata.
pub const DEFAULT_MAX_METADATA_LINES: u64 = 5_000_000;

/// Collect metadata events in order of first appearance, stopping at
/// `max_lines` or EOF. Parse failures are skipped, not fatal.
pub fn scan_metadata(
    path: &Path,
    max_lines: u64,
    progress: Option<&ProgressBar>,
) -> Result<Vec<JsonMap>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader = BufReader::new(file);

    let mut events = Vec::new();
    let mut line = Vec::new();
    let mut pos = 0u64;
    let mut seen = 0u64;
    while seen < max_lines {
        line.clear();
        let n = reader.read_until(b'\n', &mut line)? as u64;
        if n == 0 {
            break;
        }
        pos += n;
        seen += 1;

        if let LineOutcome::Event(map) = parse_line(&line) {
            if event_ts(&map).is_none() {
                events.push(map);
            }
        }
        if let Some(bar) = progress {
            if seen % 10_000 == 0 {
                bar.set_position(pos);
            }
        }
    }
    Ok(events)
}
