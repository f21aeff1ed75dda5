//! Inbound line classification
//!
//! The robot firmware emits distance readings either labelled
//! (`DIST: 87.0`) or bare (`87.0`), interleaved with free-form status text
//! such as `CMD RECV: forward`. Classification never fails: anything that is
//! not telemetry is simply informational.

use spiderbot_core::TelemetryError;

/// Label marking a distance reading
pub const DISTANCE_LABEL: &str = "DIST";

/// Separator between label and value
pub const FIELD_SEPARATOR: char = ':';

/// What an inbound line turned out to be
#[derive(Debug, Clone, PartialEq)]
pub enum InboundLine {
    /// Blank line
    Empty,
    /// Distance reading in centimeters
    Distance(f64),
    /// Line carried the distance label but no usable value
    Malformed(TelemetryError),
    /// Anything else; for the operator console only
    Info(String),
}

impl InboundLine {
    /// Distance carried by this line, if any
    pub fn distance(&self) -> Option<f64> {
        match self {
            InboundLine::Distance(d) => Some(*d),
            _ => None,
        }
    }
}

/// Classify one raw line
///
/// The label is matched as a substring anywhere in the line, so free text
/// that happens to contain it is treated as a (likely malformed) reading.
pub fn classify(raw: &str) -> InboundLine {
    let line = raw.trim();

    if line.is_empty() {
        return InboundLine::Empty;
    }

    if line.contains(DISTANCE_LABEL) {
        return match parse_labelled(line) {
            Ok(distance) => InboundLine::Distance(distance),
            Err(e) => InboundLine::Malformed(e),
        };
    }

    if is_bare_number(line) {
        if let Some(distance) = parse_reading(line) {
            return InboundLine::Distance(distance);
        }
    }

    InboundLine::Info(line.to_string())
}

fn parse_labelled(line: &str) -> Result<f64, TelemetryError> {
    let malformed = |reason: &str| TelemetryError::Parse {
        line: line.to_string(),
        reason: reason.to_string(),
    };

    let (_, value) = line
        .split_once(FIELD_SEPARATOR)
        .ok_or_else(|| malformed("missing separator"))?;

    let value = value.trim();
    if value.is_empty() {
        return Err(malformed("missing value"));
    }

    parse_reading(value).ok_or_else(|| malformed(&format!("'{}' is not a number", value)))
}

/// Any float, infinities included; NaN carries no distance and is refused
fn parse_reading(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// True for `^[0-9]*\.?[0-9]*$` with at least one digit
pub fn is_bare_number(line: &str) -> bool {
    let mut digits = 0usize;
    let mut dots = 0usize;
    for c in line.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }
    digits > 0 && dots <= 1
}
