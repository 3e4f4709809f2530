//! In-memory probe for compiling operations without ffprobe.

use super::types::{MediaProbe, ProbeError, ProbeResult};
use crate::models::{MediaAsset, StreamKind};

/// Probe answering every query with fixed readings.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FakeProbe {
    pub duration: f64,
    pub video_pts: f64,
    pub audio_pts: f64,
    pub has_audio: bool,
    /// Assets reported without audio even when `has_audio` is set.
    pub silent: &'static [&'static str],
}

impl Default for FakeProbe {
    fn default() -> Self {
        Self {
            duration: 10.0,
            video_pts: 0.0,
            audio_pts: 0.0,
            has_audio: true,
            silent: &[],
        }
    }
}

impl FakeProbe {
    fn audio_present(&self, asset: &MediaAsset) -> bool {
        self.has_audio && !self.silent.contains(&asset.to_arg().as_str())
    }
}

impl MediaProbe for FakeProbe {
    fn duration(&self, _asset: &MediaAsset) -> ProbeResult<f64> {
        Ok(self.duration)
    }

    fn first_pts(&self, asset: &MediaAsset, kind: StreamKind) -> ProbeResult<f64> {
        match kind {
            StreamKind::Video => Ok(self.video_pts),
            StreamKind::Audio if self.audio_present(asset) => Ok(self.audio_pts),
            StreamKind::Audio => Err(ProbeError::MissingStream {
                kind,
                path: asset.to_string(),
            }),
        }
    }

    fn has_audio(&self, asset: &MediaAsset) -> ProbeResult<bool> {
        Ok(self.audio_present(asset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_collects_all_readings() {
        let probe = FakeProbe {
            duration: 42.0,
            video_pts: 0.5,
            audio_pts: 0.25,
            ..FakeProbe::default()
        };
        let asset = MediaAsset::new("clip.mp4");

        let timing = probe.timing(&asset, StreamKind::Audio).unwrap();
        assert_eq!(timing.first_pts, 0.25);
        assert!(timing.has_audio);
        assert_eq!(timing.duration, 42.0);
    }

    #[test]
    fn silent_assets_have_no_audio_stream() {
        let probe = FakeProbe {
            silent: &["screen.mp4"],
            ..FakeProbe::default()
        };
        let asset = MediaAsset::new("screen.mp4");

        assert!(!probe.has_audio(&asset).unwrap());
        assert!(matches!(
            probe.timing(&asset, StreamKind::Audio),
            Err(ProbeError::MissingStream { .. })
        ));
    }
}
