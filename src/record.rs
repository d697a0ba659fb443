//! Line-level decoding of newline-delimited JSON traces.
//!
//! Traces are append-only logs of one JSON value per line, optionally
//! wrapped as a top-level JSON array. Records are schema-free: the only
//! field the engine interprets is the optional numeric `ts` (microseconds),
//! which separates timed events from metadata events.

use serde_json::Value;

/// Event timestamp in microseconds.
pub type Ts = i64;

/// A parsed trace record: an ordered key-value map, shape unknown.
pub type JsonMap = serde_json::Map<String, Value>;

pub const MICROS_PER_SEC: f64 = 1_000_000.0;

/// Outcome of decoding one trace line. Skips are values, not errors; the
/// caller decides whether to report or silently drop them.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Event(JsonMap),
    Skipped(SkipReason),
}

/// Why a line produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Blank or whitespace-only line.
    Empty,
    /// A bare `[` or `]` from the top-level array wrapping.
    ArrayDelimiter,
    /// The line is not a JSON object.
    Invalid(String),
}

/// Decode one raw trace line.
///
/// Lines ending in `},` are treated as `}`: writers that emit the trace as
/// a JSON array leave a trailing comma on every record but the last.
pub fn parse_line(raw: &[u8]) -> LineOutcome {
    let Ok(text) = std::str::from_utf8(raw) else {
        return LineOutcome::Skipped(SkipReason::Invalid("invalid utf-8".to_string()));
    };

    let mut line = text.trim();
    if line.is_empty() {
        return LineOutcome::Skipped(SkipReason::Empty);
    }
    if line == "[" || line == "]" {
        return LineOutcome::Skipped(SkipReason::ArrayDelimiter);
    }
    if line.ends_with("},") {
        line = &line[..line.len() - 1];
    }

    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(map)) => LineOutcome::Event(map),
        Ok(_) => LineOutcome::Skipped(SkipReason::Invalid("not a JSON object".to_string())),
        Err(err) => LineOutcome::Skipped(SkipReason::Invalid(err.to_string())),
    }
}

/// Timestamp of a parsed record, if it has one. Non-numeric `ts` values
/// are treated as absent.
pub fn event_ts(event: &JsonMap) -> Option<Ts> {
    match event.get("ts")? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as Ts)),
        _ => None,
    }
}

/// Decode a raw line and pull its timestamp in one step.
pub fn line_ts(raw: &[u8]) -> Option<Ts> {
    match parse_line(raw) {
        LineOutcome::Event(map) => event_ts(&map),
        LineOutcome::Skipped(_) => None,
    }
}
