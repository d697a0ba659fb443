//! Buffered range extraction: stream the bracketed byte range and write
//! every record inside the exact window to a single JSON array.

use crate::record::{JsonMap, LineOutcome, MICROS_PER_SEC, Ts, event_ts, parse_line};
use crate::summary::Summary;
use crate::utils::progress::ProgressBar;
use crate::utils::staging_path;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Default widening of the scanned range beyond the requested window.
///
/// This margin absorbs index sparsity only: the sparse index brackets time
/// approximately, so the true window edges may fall between sampled
/// points. It is distinct from the window itself and never widens which
/// records match.
pub const DEFAULT_MARGIN_SECS: f64 = 2.0;

/// A requested extraction window, in seconds relative to the first
/// timestamped record of the trace.
#[derive(Debug, Clone, Copy)]
pub struct ExtractWindow {
    pub start_secs: f64,
    pub duration_secs: f64,
    pub margin_secs: f64,
}

impl ExtractWindow {
    pub fn new(start_secs: f64, duration_secs: f64) -> Self {
        Self {
            start_secs,
            duration_secs,
            margin_secs: DEFAULT_MARGIN_SECS,
        }
    }

    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }
}

/// Result of one extraction.
#[derive(Debug)]
pub struct ExtractOutcome {
    pub output_path: PathBuf,
    /// Timestamped records that fell inside the exact window.
    pub matched: u64,
    /// The matched records themselves, when requested.
    pub records: Option<Vec<JsonMap>>,
}

/// Output name for a window: `<base>-extract-<start>s-to-<end>s.json`.
pub fn output_path(base: &Path, window: &ExtractWindow) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(format!(
        "-extract-{}s-to-{}s.json",
        window.start_secs,
        window.end_secs()
    ));
    PathBuf::from(name)
}

/// Extract `window` from the trace into `output_path`.
///
/// Metadata events are written first, unconditionally; then every record
/// whose `ts` lies inside the exact window, in file order, streamed rather
/// than buffered. The output lands under its final name only after the
/// write fully succeeds.
///
/// The byte bounds come from the summary's index; if the trace changed
/// size since the summary was built they may be stale, which only a
/// summary rebuild resolves.
pub fn extract(
    trace_path: &Path,
    summary: &Summary,
    window: ExtractWindow,
    output_path: &Path,
    keep_records: bool,
    progress: Option<&ProgressBar>,
) -> Result<ExtractOutcome> {
    if window.duration_secs < 0.0 {
        return Err(crate::error::TlexError::Config(
            "extract duration must be non-negative".to_string(),
        )
        .into());
    }

    let min_extract_ts = summary.min_ts + (window.start_secs * MICROS_PER_SEC) as Ts;
    let max_extract_ts = summary.min_ts + (window.end_secs() * MICROS_PER_SEC) as Ts;

    let margin = (window.margin_secs * MICROS_PER_SEC) as Ts;
    let buffered_min = (min_extract_ts - margin).max(summary.min_ts);
    let buffered_max = (max_extract_ts + margin).min(summary.max_ts);

    let searcher = summary.searcher();
    let (lower, _) = searcher.search(buffered_min)?;
    let (_, upper) = searcher.search(buffered_max)?;

    // Only the bracketed range gets scanned; resize the bar to match.
    if let Some(bar) = progress {
        bar.set_length(upper - lower);
    }

    let mut matched = 0u64;
    let mut records = keep_records.then(Vec::new);

    let staged = staging_path(output_path);
    {
        let out = File::create(&staged)
            .with_context(|| format!("creating {}", staged.display()))?;
        let mut out = BufWriter::new(out);
        out.write_all(b"[")?;
        let mut first = true;

        for event in &summary.metadata_events {
            write_record(&mut out, event, &mut first)?;
        }

        let file = File::open(trace_path)
            .with_context(|| format!("opening {}", trace_path.display()))?;
        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(lower))?;

        let mut pos = lower;
        let mut line = Vec::new();
        while pos < upper {
            line.clear();
            let n = reader.read_until(b'\n', &mut line)? as u64;
            if n == 0 {
                break;
            }
            pos += n;

            if let LineOutcome::Event(map) = parse_line(&line) {
                if let Some(ts) = event_ts(&map) {
                    if ts >= min_extract_ts && ts <= max_extract_ts {
                        write_record(&mut out, &map, &mut first)?;
                        matched += 1;
                        if let Some(list) = records.as_mut() {
                            list.push(map);
                        }
                    }
                }
            }
            if let Some(bar) = progress {
                bar.set_position(pos - lower);
            }
        }

        out.write_all(b"\n]")?;
        out.flush()?;
    }
    fs::rename(&staged, output_path)
        .with_context(|| format!("publishing extract {}", output_path.display()))?;

    Ok(ExtractOutcome {
        output_path: output_path.to_path_buf(),
        matched,
        records,
    })
}

fn write_record<W: Write>(out: &mut W, record: &JsonMap, first: &mut bool) -> Result<()> {
    if *first {
        out.write_all(b"\n")?;
        *first = false;
    } else {
        out.write_all(b",\n")?;
    }
    serde_json::to_writer(&mut *out, record)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "progress")]
    #[test]
    fn test_progress_bar_sized_to_bracket() {
        use crate::index;
        use crate::scan::stats;
        use std::io::Write as _;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        for i in 0..1000 {
            writeln!(file, "{{\"ts\": {}, \"name\": \"op_{:04}\"}},", i * 1000, i).unwrap();
        }
        file.flush().unwrap();
        let file_size = file.path().metadata().unwrap().len();

        let stats = stats::scan(file.path(), file_size, None).unwrap();
        let summary = Summary {
            line_count: stats.line_count,
            min_ts: stats.min_ts,
            max_ts: stats.max_ts,
            index: index::build::build(file.path(), 5000, None).unwrap(),
            metadata_events: Vec::new(),
            file_size,
        };

        // Zero margin: the scanned bracket is exactly the window's.
        let window = ExtractWindow {
            start_secs: 0.4,
            duration_secs: 0.2,
            margin_secs: 0.0,
        };
        let searcher = summary.searcher();
        let (lower, _) = searcher.search(400_000).unwrap();
        let (_, upper) = searcher.search(600_000).unwrap();

        let bar = ProgressBar::hidden();
        let out = file.path().with_extension("out.json");
        extract(file.path(), &summary, window, &out, false, Some(&bar)).unwrap();

        // The bar tracks the bracketed range, not the whole file.
        assert_eq!(bar.length(), Some(upper - lower));
        assert!(upper - lower < file_size);
    }

    #[test]
    fn test_output_path_format() {
        let window = ExtractWindow::new(0.5, 10.0);
        assert_eq!(
            output_path(Path::new("/tmp/timeline"), &window),
            PathBuf::from("/tmp/timeline-extract-0.5s-to-10.5s.json")
        );
    }
}
