//! # tlex - Time-window extraction for huge JSON event traces
//!
//! tlex locates and extracts the records inside an arbitrary time window
//! of a multi-gigabyte newline-delimited JSON trace (Chrome-trace-style
//! event logs, as emitted by distributed-training profilers) without
//! reading the whole file, and keeps working incrementally as the trace
//! grows.
//!
//! ## Architecture
//!
//! - [`record`] - line decoding, trailing-comma tolerance, `ts` extraction
//! - [`scan`] - full-pass statistics and metadata-event discovery
//! - [`index`] - sparse timestamp-to-offset index: build, search, validate
//! - [`summary`] - cached statistics and their `.sum.json` sidecar
//! - [`extract`] - buffered range extraction into a JSON array
//! - [`timeline`] - per-trace session tying the pieces together
//! - [`error`] - typed fatal errors; parse skips are values, not errors
//!
//! ## Quick Start
//!
//! ```ignore
//! use tlex::extract::ExtractWindow;
//! use tlex::timeline::{Timeline, TimelineOptions};
//! use std::path::Path;
//!
//! let timeline = Timeline::open(Path::new("trace.json"), TimelineOptions::default())?;
//! let outcome = timeline.extract(ExtractWindow::new(0.4, 0.2), false)?;
//! println!("wrote {}", outcome.output_path.display());
//! ```
//!
//! ## How it stays fast
//!
//! A first pass derives line count and timestamp bounds, then a sparse
//! (timestamp, byte offset) index is sampled at byte strides. Both are
//! persisted in a sidecar keyed by file size, so later extractions only
//! re-scan the bounded byte range that brackets the requested window.

pub mod error;
pub mod extract;
pub mod index;
pub mod record;
pub mod scan;
pub mod summary;
pub mod timeline;
pub mod utils;
