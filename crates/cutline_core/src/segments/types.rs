//! Segment values and timestamp parsing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from segment construction and concatenation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentError {
    #[error("No segments given")]
    Empty,

    #[error("Invalid segment {start}..{end}: start must be >= 0 and end after start")]
    InvalidRange { start: f64, end: f64 },

    #[error("Invalid timestamp '{0}': expected HH:MM:SS(.fff), MM:SS or seconds")]
    InvalidTimestamp(String),
}

/// A half-open span of the source timeline, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSegment")]
pub struct Segment {
    start: f64,
    end: f64,
}

#[derive(Deserialize)]
struct RawSegment {
    start: f64,
    end: f64,
}

impl TryFrom<RawSegment> for Segment {
    type Error = SegmentError;

    fn try_from(raw: RawSegment) -> Result<Self, Self::Error> {
        Segment::new(raw.start, raw.end)
    }
}

impl Segment {
    /// Create a segment. Both bounds must be finite, `start >= 0` and
    /// `end > start`.
    pub fn new(start: f64, end: f64) -> Result<Self, SegmentError> {
        if !start.is_finite() || !end.is_finite() || start < 0.0 || end <= start {
            return Err(SegmentError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parse both bounds from timestamp strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, SegmentError> {
        Self::new(parse_timestamp(start)?, parse_timestamp(end)?)
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}s-{:.3}s", self.start, self.end)
    }
}

/// Parse `HH:MM:SS(.fff)`, `MM:SS(.fff)` or plain seconds.
pub fn parse_timestamp(text: &str) -> Result<f64, SegmentError> {
    let invalid = || SegmentError::InvalidTimestamp(text.to_string());
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() > 3 {
        return Err(invalid());
    }

    let (last, whole) = parts.split_last().ok_or_else(invalid)?;
    let seconds: f64 = parse_field(last).ok_or_else(invalid)?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(invalid());
    }
    if !whole.is_empty() && seconds >= 60.0 {
        return Err(invalid());
    }

    let mut total = 0.0;
    for (i, field) in whole.iter().enumerate() {
        if field.contains('.') {
            return Err(invalid());
        }
        let value: u32 = field.parse().map_err(|_| invalid())?;
        // minutes are bounded when hours are present
        if whole.len() == 2 && i == 1 && value >= 60 {
            return Err(invalid());
        }
        total = total * 60.0 + f64::from(value);
    }

    Ok(total * 60.0 + seconds)
}

fn parse_field(field: &str) -> Option<f64> {
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    field.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_validation() {
        assert!(Segment::new(5.0, 10.0).is_ok());
        assert_eq!(
            Segment::new(10.0, 5.0),
            Err(SegmentError::InvalidRange {
                start: 10.0,
                end: 5.0
            })
        );
        assert!(Segment::new(3.0, 3.0).is_err());
        assert!(Segment::new(-1.0, 3.0).is_err());
        assert!(Segment::new(0.0, f64::INFINITY).is_err());
        assert!(Segment::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn segment_duration() {
        let seg = Segment::new(1.5, 4.0).unwrap();
        assert_eq!(seg.duration(), 2.5);
        assert_eq!(seg.to_string(), "1.500s-4.000s");
    }

    #[test]
    fn parses_timestamps() {
        assert_eq!(parse_timestamp("12.5").unwrap(), 12.5);
        assert_eq!(parse_timestamp("01:30").unwrap(), 90.0);
        assert_eq!(parse_timestamp("1:02:03.5").unwrap(), 3723.5);
        assert_eq!(parse_timestamp("00:00:00").unwrap(), 0.0);
        assert_eq!(parse_timestamp(" 75 ").unwrap(), 75.0);
    }

    #[test]
    fn rejects_bad_timestamps() {
        for text in ["", "abc", "1:2:3:4", "00:61", "1:60:00", "-5", "1.5:00", "1e3", "::"] {
            assert_eq!(
                parse_timestamp(text),
                Err(SegmentError::InvalidTimestamp(text.to_string())),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn parse_builds_segment() {
        let seg = Segment::parse("00:00:05", "00:00:10").unwrap();
        assert_eq!((seg.start(), seg.end()), (5.0, 10.0));
        assert!(Segment::parse("00:10", "00:05").is_err());
    }

    #[test]
    fn deserialization_validates() {
        let ok: Segment = serde_json::from_str(r#"{"start":1,"end":2}"#).unwrap();
        assert_eq!(ok.duration(), 1.0);
        assert!(serde_json::from_str::<Segment>(r#"{"start":2,"end":1}"#).is_err());
    }
}
