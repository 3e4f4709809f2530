//! High-level editing operations.
//!
//! Each [`Operation`] compiles, with a [`MediaProbe`] and the current
//! [`Settings`], into one ffmpeg [`Command`]. Compiling never runs ffmpeg;
//! the probe is the only I/O.
//!
//! ```text
//! Operation --(probe + settings)--> FilterGraph + maps + codec flags --> Command
//! ```

mod audio;
mod video;

pub use audio::AudioTrack;
pub use video::{ExportProfile, Platform, Position, PIP_MARGIN};

use serde::{Deserialize, Serialize};

use crate::command::{Command, CommandBuilder};
use crate::config::Settings;
use crate::editor::{EditorError, EditorResult};
use crate::graph::Effect;
use crate::models::MediaAsset;
use crate::probe::MediaProbe;
use crate::segments::Segment;

/// One editing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Operation {
    /// Keep the given segments of `input`, joined in order.
    TrimSegments {
        input: MediaAsset,
        segments: Vec<Segment>,
    },
    /// Lay an external audio track onto a video, aligned by first PTS.
    SyncAudio {
        video: MediaAsset,
        audio: MediaAsset,
        #[serde(default)]
        manual_offset: f64,
    },
    /// Join whole files end to end, in order.
    MergeVideos { inputs: Vec<MediaAsset> },
    /// Write the audio of `input` to its own file.
    ExtractAudio { input: MediaAsset },
    /// Mix several audio files into one track.
    MixAudio { tracks: Vec<AudioTrack> },
    /// Mix a music bed under a video's audio.
    BackgroundMusic {
        video: MediaAsset,
        music: MediaAsset,
        #[serde(default = "default_music_volume")]
        volume: f64,
        #[serde(default = "default_music_fade")]
        fade: f64,
    },
    /// Fade the audio of `input` in and/or out.
    FadeAudio {
        input: MediaAsset,
        #[serde(default)]
        fade_in: f64,
        #[serde(default)]
        fade_out: f64,
    },
    /// Run an effect chain over each plane of `input`.
    ApplyEffects {
        input: MediaAsset,
        #[serde(default)]
        video: Vec<Effect>,
        #[serde(default)]
        audio: Vec<Effect>,
    },
    /// Composite `overlay` at quarter size over `main`.
    PictureInPicture {
        main: MediaAsset,
        overlay: MediaAsset,
        #[serde(default)]
        position: Position,
    },
    /// Re-encode `input` to a delivery profile.
    Export {
        input: MediaAsset,
        profile: ExportProfile,
    },
}

fn default_music_volume() -> f64 {
    0.3
}

fn default_music_fade() -> f64 {
    2.0
}

impl Operation {
    /// Short name used for log files and messages.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::TrimSegments { .. } => "trim_segments",
            Operation::SyncAudio { .. } => "sync_audio",
            Operation::MergeVideos { .. } => "merge_videos",
            Operation::ExtractAudio { .. } => "extract_audio",
            Operation::MixAudio { .. } => "mix_audio",
            Operation::BackgroundMusic { .. } => "background_music",
            Operation::FadeAudio { .. } => "fade_audio",
            Operation::ApplyEffects { .. } => "apply_effects",
            Operation::PictureInPicture { .. } => "picture_in_picture",
            Operation::Export { .. } => "export",
        }
    }

    /// Input assets in `-i` order.
    pub fn inputs(&self) -> Vec<&MediaAsset> {
        match self {
            Operation::TrimSegments { input, .. }
            | Operation::FadeAudio { input, .. }
            | Operation::ApplyEffects { input, .. }
            | Operation::Export { input, .. }
            | Operation::ExtractAudio { input } => vec![input],
            Operation::MergeVideos { inputs } => inputs.iter().collect(),
            Operation::SyncAudio { video, audio, .. } => vec![video, audio],
            Operation::MixAudio { tracks } => tracks.iter().map(|t| &t.input).collect(),
            Operation::BackgroundMusic { video, music, .. } => vec![video, music],
            Operation::PictureInPicture { main, overlay, .. } => vec![main, overlay],
        }
    }

    /// Compile into a command writing to `output`.
    pub fn compile(
        &self,
        probe: &dyn MediaProbe,
        settings: &Settings,
        output: &MediaAsset,
    ) -> EditorResult<Command> {
        tracing::debug!("Compiling {} -> {}", self.name(), output);
        match self {
            Operation::TrimSegments { input, segments } => {
                video::trim_segments(probe, settings, input, segments, output)
            }
            Operation::SyncAudio {
                video,
                audio,
                manual_offset,
            } => audio::sync_audio(probe, settings, video, audio, *manual_offset, output),
            Operation::MergeVideos { inputs } => {
                video::merge_videos(probe, settings, inputs, output)
            }
            Operation::ExtractAudio { input } => {
                audio::extract_audio(probe, settings, input, output)
            }
            Operation::MixAudio { tracks } => audio::mix_audio(settings, tracks, output),
            Operation::BackgroundMusic {
                video,
                music,
                volume,
                fade,
            } => audio::background_music(probe, settings, video, music, *volume, *fade, output),
            Operation::FadeAudio {
                input,
                fade_in,
                fade_out,
            } => audio::fade_audio(probe, settings, input, *fade_in, *fade_out, output),
            Operation::ApplyEffects {
                input,
                video,
                audio,
            } => video::apply_effects(probe, settings, input, video, audio, output),
            Operation::PictureInPicture {
                main,
                overlay,
                position,
            } => video::picture_in_picture(settings, main, overlay, *position, output),
            Operation::Export { input, profile } => {
                video::export(settings, input, profile, output)
            }
        }
    }
}

/// ffmpeg invocation with the configured executable and global flags.
fn ffmpeg(settings: &Settings) -> CommandBuilder {
    CommandBuilder::new(&settings.tools.ffmpeg)
        .hide_banner(settings.execution.hide_banner)
        .overwrite(settings.execution.overwrite)
}

/// Configured audio codec and bitrate.
fn audio_encoding(builder: CommandBuilder, settings: &Settings) -> CommandBuilder {
    builder
        .option("-c:a", &settings.encoding.audio_codec)
        .option("-b:a", &settings.encoding.audio_bitrate)
}

/// Add `+faststart` where the container supports it, then build.
fn finish(
    builder: CommandBuilder,
    settings: &Settings,
    output: &MediaAsset,
) -> EditorResult<Command> {
    let builder = if settings.encoding.faststart && supports_faststart(output) {
        builder.option("-movflags", "+faststart")
    } else {
        builder
    };
    Ok(builder.build(output.clone())?)
}

/// MP4-family containers only.
fn supports_faststart(output: &MediaAsset) -> bool {
    output
        .path()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            matches!(
                e.to_ascii_lowercase().as_str(),
                "mp4" | "mov" | "m4a" | "m4v"
            )
        })
        .unwrap_or(false)
}

/// Reject NaN, infinite and negative durations.
fn check_seconds(what: &str, value: f64) -> EditorResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(EditorError::invalid_operation(format!(
            "{} must be a non-negative number of seconds, got {}",
            what, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::fake::FakeProbe;

    fn out(name: &str) -> MediaAsset {
        MediaAsset::new(name)
    }

    #[test]
    fn faststart_only_for_mp4_family() {
        assert!(supports_faststart(&out("a.mp4")));
        assert!(supports_faststart(&out("a.MOV")));
        assert!(supports_faststart(&out("a.m4a")));
        assert!(!supports_faststart(&out("a.mkv")));
        assert!(!supports_faststart(&out("a.wav")));
        assert!(!supports_faststart(&out("noext")));
    }

    #[test]
    fn faststart_can_be_disabled() {
        let mut settings = Settings::default();
        settings.encoding.faststart = false;
        let op = Operation::FadeAudio {
            input: "in.mp4".into(),
            fade_in: 1.0,
            fade_out: 0.0,
        };
        let command = op
            .compile(&FakeProbe::default(), &settings, &out("out.mp4"))
            .unwrap();
        assert_eq!(command.arg_value("-movflags"), None);
    }

    #[test]
    fn global_flags_follow_settings() {
        let mut settings = Settings::default();
        settings.tools.ffmpeg = "/opt/ffmpeg/bin/ffmpeg".to_string();
        settings.execution.overwrite = false;
        settings.execution.hide_banner = false;

        let op = Operation::MixAudio {
            tracks: vec![AudioTrack::new("a.wav", 1.0)],
        };
        let command = op
            .compile(&FakeProbe::default(), &settings, &out("mix.wav"))
            .unwrap();

        assert_eq!(command.executable(), "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(command.args()[0], "-n");
        assert!(!command.args().iter().any(|a| a == "-hide_banner"));
    }

    #[test]
    fn compile_is_deterministic() {
        let op = Operation::SyncAudio {
            video: "v.mp4".into(),
            audio: "a.wav".into(),
            manual_offset: 0.25,
        };
        let probe = FakeProbe::default();
        let settings = Settings::default();
        let a = op.compile(&probe, &settings, &out("o.mp4")).unwrap();
        let b = op.compile(&probe, &settings, &out("o.mp4")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn names_and_inputs() {
        let op = Operation::PictureInPicture {
            main: "main.mp4".into(),
            overlay: "cam.mp4".into(),
            position: Position::TopLeft,
        };
        assert_eq!(op.name(), "picture_in_picture");
        let inputs: Vec<String> = op.inputs().iter().map(|a| a.to_string()).collect();
        assert_eq!(inputs, vec!["main.mp4", "cam.mp4"]);
    }

    #[test]
    fn deserializes_from_json() {
        let json = r#"{
            "operation": "background_music",
            "video": "talk.mp4",
            "music": "bed.mp3"
        }"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        assert_eq!(
            op,
            Operation::BackgroundMusic {
                video: "talk.mp4".into(),
                music: "bed.mp3".into(),
                volume: 0.3,
                fade: 2.0,
            }
        );

        let json = r#"{
            "operation": "trim_segments",
            "input": "in.mp4",
            "segments": [{"start": 5, "end": 10}, {"start": 15, "end": 20}]
        }"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        assert_eq!(op.name(), "trim_segments");

        let json = r#"{"operation": "merge_videos", "inputs": ["a.mp4", "b.mp4"]}"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        assert_eq!(op.name(), "merge_videos");
        assert_eq!(op.inputs().len(), 2);
    }

    #[test]
    fn negative_seconds_are_rejected() {
        assert!(check_seconds("fade", 1.5).is_ok());
        assert!(check_seconds("fade", -0.1).is_err());
        assert!(check_seconds("fade", f64::NAN).is_err());
    }
}
