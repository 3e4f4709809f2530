//! Audio delay calculation.
//!
//! All sync math happens here. The external audio is delayed so its first
//! sample lines up with the first video frame of the target:
//!
//! ```text
//! total_s  = video_start - audio_start + manual_offset
//! delay_ms = round(max(0, total_s) * 1000)
//! ```
//!
//! - `video_start`: first PTS of the target's video stream (seconds)
//! - `audio_start`: first PTS of the external audio stream (seconds)
//! - `manual_offset`: user adjustment in seconds, may be negative
//!
//! A negative total means the audio would have to start before the video.
//! `adelay` cannot pull audio earlier, so the delay clamps to zero.
//!
//! Rounding is half away from zero (`f64::round`): 2.5 ms becomes 3 ms.

use serde::Serialize;

/// Outcome of one delay calculation, kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SyncSummary {
    /// First video PTS of the target, seconds.
    pub video_start: f64,
    /// First audio PTS of the external track, seconds.
    pub audio_start: f64,
    /// User adjustment, seconds.
    pub manual_offset: f64,
    /// Delay to apply to the external audio, milliseconds.
    pub delay_ms: i64,
    /// True when the raw total was negative and got clamped.
    pub clamped: bool,
}

impl SyncSummary {
    /// Compute the delay and log the summary at info level.
    pub fn calculate(video_start: f64, audio_start: f64, manual_offset: f64) -> Self {
        let raw = video_start - audio_start + manual_offset;
        let summary = Self {
            video_start,
            audio_start,
            manual_offset,
            delay_ms: compute_delay(video_start, audio_start, manual_offset),
            clamped: raw < 0.0,
        };
        tracing::info!("{}", summary);
        summary
    }
}

impl std::fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Sync: video starts at {:.3}s, audio starts at {:.3}s, manual offset {:+.3}s -> audio delay {}",
            self.video_start,
            self.audio_start,
            self.manual_offset,
            format_delay(self.delay_ms)
        )?;
        if self.clamped {
            write!(f, " (clamped, audio would start before video)")?;
        }
        Ok(())
    }
}

/// Delay in milliseconds for the external audio. Never negative.
///
/// Non-finite inputs produce a total that is not greater than zero and
/// therefore yield 0.
pub fn compute_delay(video_start: f64, audio_start: f64, manual_offset: f64) -> i64 {
    let total = video_start - audio_start + manual_offset;
    if total.is_nan() || total <= 0.0 {
        return 0;
    }
    (total * 1000.0).round() as i64
}

/// Format a delay for logging.
pub fn format_delay(delay_ms: i64) -> String {
    if delay_ms == 0 {
        "0ms".to_string()
    } else if delay_ms > 0 {
        format!("+{}ms", delay_ms)
    } else {
        format!("{}ms", delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_after_audio() {
        assert_eq!(compute_delay(1.200, 0.050, 0.0), 1150);
    }

    #[test]
    fn test_audio_after_video_clamps() {
        assert_eq!(compute_delay(0.0, 2.0, 0.0), 0);
    }

    #[test]
    fn test_manual_offset() {
        assert_eq!(compute_delay(1.0, 1.0, 0.25), 250);
        // Negative offset pulls the delay down, then clamps
        assert_eq!(compute_delay(1.0, 0.5, -0.2), 300);
        assert_eq!(compute_delay(1.0, 0.5, -1.0), 0);
    }

    #[test]
    fn test_half_rounds_away_from_zero() {
        assert_eq!(compute_delay(0.0025, 0.0, 0.0), 3);
        assert_eq!(compute_delay(0.0005, 0.0, 0.0), 1);
        assert_eq!(compute_delay(0.0004, 0.0, 0.0), 0);
    }

    #[test]
    fn test_non_finite_inputs() {
        assert_eq!(compute_delay(f64::NAN, 0.0, 0.0), 0);
        assert_eq!(compute_delay(0.0, f64::INFINITY, 0.0), 0);
    }

    #[test]
    fn test_delay_matches_formula() {
        let starts = [0.0, 0.021, 0.5, 1.2, 3.333];
        let offsets = [-1.5, -0.1, 0.0, 0.04, 2.0];
        for &v in &starts {
            for &a in &starts {
                for &m in &offsets {
                    let delay = compute_delay(v, a, m);
                    let expected = ((v - a + m).max(0.0) * 1000.0).round() as i64;
                    assert!(delay >= 0);
                    assert_eq!(delay, expected, "v={} a={} m={}", v, a, m);
                }
            }
        }
    }

    #[test]
    fn test_summary() {
        let summary = SyncSummary::calculate(1.2, 0.05, 0.0);
        assert_eq!(summary.delay_ms, 1150);
        assert!(!summary.clamped);
        assert!(summary.to_string().contains("+1150ms"));

        let clamped = SyncSummary::calculate(0.0, 2.0, 0.0);
        assert_eq!(clamped.delay_ms, 0);
        assert!(clamped.clamped);
        assert!(clamped.to_string().contains("clamped"));
    }

    #[test]
    fn test_format_delay() {
        assert_eq!(format_delay(0), "0ms");
        assert_eq!(format_delay(150), "+150ms");
        assert_eq!(format_delay(-42), "-42ms");
    }
}
