//! Cached per-trace statistics and their sidecar persistence.

use crate::error::IndexViolation;
use crate::index::{IndexSearcher, TimeIndex, validate};
use crate::record::{JsonMap, MICROS_PER_SEC, Ts};
use crate::utils::staging_path;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Derived statistics for one trace file, persisted as a sidecar so later
/// invocations skip re-scanning an unchanged trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub line_count: u64,
    /// Timestamp bounds in microseconds.
    pub min_ts: Ts,
    pub max_ts: Ts,
    pub index: TimeIndex,
    pub metadata_events: Vec<JsonMap>,
    /// Trace size observed when this summary was computed; the staleness
    /// key. Any mismatch with the current size marks the counts, bounds
    /// and index as potentially stale.
    pub file_size: u64,
}

impl Summary {
    pub fn duration_secs(&self) -> f64 {
        (self.max_ts - self.min_ts) as f64 / MICROS_PER_SEC
    }

    /// Searcher over this summary's index and bounds.
    pub fn searcher(&self) -> IndexSearcher<'_> {
        IndexSearcher::new(&self.index, self.min_ts, self.max_ts, self.file_size)
    }

    /// Structural validation of the index against this summary's bounds.
    pub fn validate_index(&self) -> Result<(), IndexViolation> {
        validate::validate(&self.index, self.min_ts, self.max_ts, self.file_size)
    }
}

/// Base path of a trace: the path with a trailing `.json` stripped. All
/// sidecar and output names derive from it.
pub fn trace_base(path: &Path) -> PathBuf {
    let s = path.as_os_str().to_string_lossy();
    match s.strip_suffix(".json") {
        Some(stripped) => PathBuf::from(stripped),
        None => path.to_path_buf(),
    }
}

/// Loads and persists the `<base>.sum.json` sidecar for one trace path.
///
/// Not safe across processes: a single writer per trace path is assumed,
/// and concurrent writers risk lost updates.
#[derive(Debug)]
pub struct SummaryStore {
    sidecar: PathBuf,
}

impl SummaryStore {
    pub fn for_trace(path: &Path) -> Self {
        let mut sidecar = trace_base(path).into_os_string();
        sidecar.push(".sum.json");
        Self {
            sidecar: PathBuf::from(sidecar),
        }
    }

    pub fn sidecar_path(&self) -> &Path {
        &self.sidecar
    }

    /// Load the cached summary, or `None` when no sidecar exists yet.
    pub fn load(&self) -> Result<Option<Summary>> {
        if !self.sidecar.exists() {
            return Ok(None);
        }
        let file = File::open(&self.sidecar)
            .with_context(|| format!("opening summary {}", self.sidecar.display()))?;
        let summary = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("decoding summary {}", self.sidecar.display()))?;
        Ok(Some(summary))
    }

    /// Persist atomically: the sidecar is staged next to its final name
    /// and renamed into place, so a partial write is never visible.
    pub fn save(&self, summary: &Summary) -> Result<()> {
        let staged = staging_path(&self.sidecar);
        {
            let file = File::create(&staged)
                .with_context(|| format!("creating {}", staged.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, summary)?;
            writer.flush()?;
        }
        fs::rename(&staged, &self.sidecar)
            .with_context(|| format!("publishing summary {}", self.sidecar.display()))?;
        Ok(())
    }
}
