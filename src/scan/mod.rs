//! Whole-file scanning passes: trace statistics and metadata discovery.

pub mod metadata;
pub mod stats;
