//! Timeline session: loads or rebuilds the summary for one trace and
//! answers statistics, extraction and validation requests against it.

use crate::error::{IndexViolation, TlexError};
use crate::extract::{self, ExtractOutcome, ExtractWindow};
use crate::index;
use crate::record::{MICROS_PER_SEC, Ts};
use crate::scan::metadata::{DEFAULT_MAX_METADATA_LINES, scan_metadata};
use crate::scan::stats::scan;
use crate::summary::{Summary, SummaryStore, trace_base};
use crate::utils::progress::byte_progress;
use crate::utils::{humanize_bytes, humanize_count, humanize_duration};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SECS_PER_INDEX: f64 = 1.0;

/// Options for opening a [`Timeline`] session.
#[derive(Debug, Clone)]
pub struct TimelineOptions {
    /// Discard any cached summary and rebuild everything.
    pub force_rebuild: bool,
    /// Rebuild line count and index coverage whenever the trace has grown.
    pub live: bool,
    /// Explicit index stride in bytes. Mutually exclusive with
    /// `secs_per_index`.
    pub bytes_per_index: Option<u64>,
    /// Target time granularity of the index; converted to an approximate
    /// byte stride from file size and duration.
    pub secs_per_index: Option<f64>,
    pub max_metadata_lines: u64,
    /// End of a planned extraction, in seconds from trace start. A cached
    /// summary that does not cover it is rebuilt even without `live`.
    pub needed_through_secs: Option<f64>,
    /// Suppress progress reporting.
    pub quiet: bool,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            force_rebuild: false,
            live: false,
            bytes_per_index: None,
            secs_per_index: None,
            max_metadata_lines: DEFAULT_MAX_METADATA_LINES,
            needed_through_secs: None,
            quiet: false,
        }
    }
}

impl TimelineOptions {
    fn check(&self) -> Result<(), TlexError> {
        match (self.bytes_per_index, self.secs_per_index) {
            (Some(_), Some(_)) => Err(TlexError::Config(
                "bytes-per-index and secs-per-index are mutually exclusive".to_string(),
            )),
            (Some(0), None) => Err(TlexError::Config(
                "bytes-per-index must be positive".to_string(),
            )),
            (None, Some(secs)) if secs <= 0.0 => Err(TlexError::Config(
                "secs-per-index must be positive".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Resolve the index stride in bytes. `check()` has already rejected
    /// conflicting or non-positive settings.
    fn stride(&self, file_size: u64, duration_secs: f64) -> u64 {
        if let Some(bytes) = self.bytes_per_index {
            return bytes;
        }
        let secs = self.secs_per_index.unwrap_or(DEFAULT_SECS_PER_INDEX);
        let steps = (duration_secs / secs).max(1.0);
        ((file_size as f64 / steps) as u64).max(1)
    }
}

/// One analysis session over a trace file. Owns the summary for the
/// session and the store it came from; no process-wide state.
#[derive(Debug)]
pub struct Timeline {
    path: PathBuf,
    base: PathBuf,
    store: SummaryStore,
    summary: Summary,
    quiet: bool,
}

impl Timeline {
    /// Open the trace, loading the cached summary when it is usable and
    /// selectively rebuilding what is stale.
    pub fn open(path: &Path, options: TimelineOptions) -> Result<Self> {
        options.check()?;

        let path = path
            .canonicalize()
            .with_context(|| format!("invalid trace path {}", path.display()))?;
        let file_size = fs::metadata(&path)?.len();
        let base = trace_base(&path);
        let store = SummaryStore::for_trace(&path);

        let cached = if options.force_rebuild {
            None
        } else {
            store.load()?
        };
        let fresh = cached.is_none();

        let mut rebuild_stats = fresh;
        let mut rebuild_index = fresh;
        let rebuild_metadata = fresh;

        if let Some(summary) = &cached {
            if file_size != summary.file_size {
                // The caller decides what a size mismatch means: live mode
                // always refreshes; otherwise only a window reaching past
                // the cached max_ts does.
                if options.live {
                    rebuild_stats = true;
                    rebuild_index = true;
                }
                if let Some(end_secs) = options.needed_through_secs {
                    let needed_ts = summary.min_ts + (end_secs * MICROS_PER_SEC) as Ts;
                    if needed_ts > summary.max_ts {
                        rebuild_stats = true;
                        rebuild_index = true;
                    }
                }
            }
        }

        let mut summary = cached.unwrap_or_else(|| Summary {
            line_count: 0,
            min_ts: 0,
            max_ts: 0,
            index: Vec::new(),
            metadata_events: Vec::new(),
            file_size,
        });
        let changed = rebuild_stats || rebuild_metadata || rebuild_index;

        if rebuild_stats {
            let bar = byte_progress(file_size, "Scanning trace", options.quiet);
            let stats = scan(&path, file_size, bar.as_ref())?;
            if let Some(bar) = bar {
                bar.finish_and_clear();
            }
            summary.line_count = stats.line_count;
            summary.max_ts = stats.max_ts;
            // The trace is append-only: once known, min_ts never moves.
            if fresh {
                summary.min_ts = stats.min_ts;
            }
        }

        if rebuild_metadata {
            let bar = byte_progress(file_size, "Finding metadata", options.quiet);
            summary.metadata_events =
                scan_metadata(&path, options.max_metadata_lines, bar.as_ref())?;
            if let Some(bar) = bar {
                bar.finish_and_clear();
            }
        }

        if rebuild_index {
            let stride = options.stride(file_size, summary.duration_secs());
            let bar = byte_progress(file_size, "Building index", options.quiet);
            let resume = summary.index.last().map(|entry| entry.offset);
            summary.index = match resume {
                // Grown trace: extend from the last indexed offset so the
                // existing prefix stays untouched.
                Some(offset) => index::build::extend(
                    &path,
                    stride,
                    offset,
                    std::mem::take(&mut summary.index),
                    bar.as_ref(),
                )?,
                None => index::build::build(&path, stride, bar.as_ref())?,
            };
            if let Some(bar) = bar {
                bar.finish_and_clear();
            }
        }

        if changed {
            summary.file_size = file_size;
            store.save(&summary)?;
        }

        Ok(Self {
            path,
            base,
            store,
            summary,
            quiet: options.quiet,
        })
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn trace_path(&self) -> &Path {
        &self.path
    }

    pub fn sidecar_path(&self) -> &Path {
        self.store.sidecar_path()
    }

    /// Extract a window into `<base>-extract-<start>s-to-<end>s.json`.
    pub fn extract(&self, window: ExtractWindow, keep_records: bool) -> Result<ExtractOutcome> {
        let output = extract::output_path(&self.base, &window);
        let bar = byte_progress(self.summary.file_size, "Extracting", self.quiet);
        let outcome = extract::extract(
            &self.path,
            &self.summary,
            window,
            &output,
            keep_records,
            bar.as_ref(),
        )?;
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
        Ok(outcome)
    }

    /// Structural validation of the cached index. This does not detect an
    /// index that is merely stale relative to a changed trace.
    pub fn validate_index(&self) -> Result<(), IndexViolation> {
        self.summary.validate_index()
    }

    /// Print human-readable statistics for the trace.
    pub fn print_stats(&self) {
        let s = &self.summary;
        println!("Trace:      {}", self.path.display());
        println!("File size:  {}", humanize_bytes(s.file_size));
        println!("Duration:   {}", humanize_duration(s.duration_secs()));
        println!("Lines:      {}", humanize_count(s.line_count));
        println!(
            "Index:      {} entries",
            humanize_count(s.index.len() as u64)
        );
        if let Some(gap) = index::mean_entry_gap(&s.index) {
            println!("Index gap:  {} mean", humanize_duration(gap / MICROS_PER_SEC));
        }
    }
}
