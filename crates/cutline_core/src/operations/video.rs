//! Video operations: segment trims, merges, effect chains,
//! picture-in-picture and platform exports.

use serde::{Deserialize, Serialize};

use super::{audio_encoding, ffmpeg, finish};
use crate::command::Command;
use crate::config::Settings;
use crate::editor::{EditorError, EditorResult};
use crate::graph::{Effect, FilterGraphBuilder, FilterRequest, FilterStage, Pad};
use crate::models::{MediaAsset, StreamKind};
use crate::probe::MediaProbe;
use crate::segments::{build_concat_with, Segment};

/// Distance in pixels between the overlay and the frame edge.
pub const PIP_MARGIN: u32 = 10;

/// Where the picture-in-picture overlay sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

impl Position {
    /// `overlay` x/y expressions for this position.
    pub fn overlay_xy(&self, margin: u32) -> (String, String) {
        let left = margin.to_string();
        let top = margin.to_string();
        let right = format!("main_w-overlay_w-{}", margin);
        let bottom = format!("main_h-overlay_h-{}", margin);
        match self {
            Position::TopLeft => (left, top),
            Position::TopRight => (right, top),
            Position::BottomLeft => (left, bottom),
            Position::BottomRight => (right, bottom),
            Position::Center => (
                "(main_w-overlay_w)/2".to_string(),
                "(main_h-overlay_h)/2".to_string(),
            ),
        }
    }
}

/// Delivery targets with a preset [`ExportProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Douyin,
    Xiaohongshu,
    Wechat,
    Bilibili,
    Youtube,
}

/// Output size, frame rate and bitrate for an export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportProfile {
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub fps: Option<f64>,
    pub video_bitrate: String,
    #[serde(default = "default_preset")]
    pub preset: String,
}

fn default_preset() -> String {
    "slow".to_string()
}

impl Default for ExportProfile {
    /// Vertical 1080x1920 at 5 Mb/s, source frame rate.
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: None,
            video_bitrate: "5M".to_string(),
            preset: default_preset(),
        }
    }
}

impl ExportProfile {
    /// Preset for a platform; all run at 30 fps.
    pub fn for_platform(platform: Platform) -> Self {
        let (width, height, bitrate) = match platform {
            Platform::Douyin => (1080, 1920, "8M"),
            Platform::Xiaohongshu | Platform::Wechat => (1080, 1920, "6M"),
            Platform::Bilibili => (1920, 1080, "8M"),
            Platform::Youtube => (1920, 1080, "12M"),
        };
        Self {
            width,
            height,
            fps: Some(30.0),
            video_bitrate: bitrate.to_string(),
            preset: default_preset(),
        }
    }
}

pub(super) fn trim_segments(
    probe: &dyn MediaProbe,
    settings: &Settings,
    input: &MediaAsset,
    segments: &[Segment],
    output: &MediaAsset,
) -> EditorResult<Command> {
    let has_audio = probe.has_audio(input)?;
    let graph = build_concat_with(segments, has_audio)?;

    let builder = ffmpeg(settings)
        .input(input.clone())
        .filter_graph(graph)
        .map_outputs()
        .option("-c:v", &settings.encoding.video_codec);
    let builder = if has_audio {
        audio_encoding(builder, settings)
    } else {
        builder
    };
    finish(builder, settings, output)
}

/// Join whole files end to end with one `concat` per plane.
///
/// Audio is joined only when every input has an audio stream; otherwise the
/// result is video-only. The `concat` filter needs matching frame sizes.
pub(super) fn merge_videos(
    probe: &dyn MediaProbe,
    settings: &Settings,
    inputs: &[MediaAsset],
    output: &MediaAsset,
) -> EditorResult<Command> {
    if inputs.len() < 2 {
        return Err(EditorError::invalid_operation(format!(
            "merge needs at least two inputs, got {}",
            inputs.len()
        )));
    }

    let mut with_audio = true;
    for input in inputs {
        if !probe.has_audio(input)? {
            tracing::warn!("{} has no audio; merging video only", input);
            with_audio = false;
            break;
        }
    }

    let mut graph = FilterGraphBuilder::new();
    let mut outputs = vec![graph.push(join_request(StreamKind::Video, inputs.len()))?];
    if with_audio {
        outputs.push(graph.push(join_request(StreamKind::Audio, inputs.len()))?);
    }

    let builder = inputs
        .iter()
        .fold(ffmpeg(settings), |b, input| b.input(input.clone()))
        .filter_graph(graph.finish(outputs)?)
        .map_outputs()
        .option("-c:v", &settings.encoding.video_codec);
    let builder = if with_audio {
        audio_encoding(builder, settings)
    } else {
        builder
    };
    finish(builder, settings, output)
}

/// `[0:x][1:x]..concat=n=N` over one plane of every input.
fn join_request(kind: StreamKind, count: usize) -> FilterRequest {
    let (v, a) = match kind {
        StreamKind::Video => (1, 0),
        StreamKind::Audio => (0, 1),
    };
    FilterRequest::new(
        kind,
        FilterStage::new("concat")
            .param("n", count)
            .param("v", v)
            .param("a", a),
        count,
    )
    .inputs((0..count).map(|i| match kind {
        StreamKind::Video => Pad::video(i),
        StreamKind::Audio => Pad::audio(i),
    }))
}

/// A plane with no effects is copied through untouched.
pub(super) fn apply_effects(
    probe: &dyn MediaProbe,
    settings: &Settings,
    input: &MediaAsset,
    video: &[Effect],
    audio: &[Effect],
    output: &MediaAsset,
) -> EditorResult<Command> {
    if video.is_empty() && audio.is_empty() {
        return Err(EditorError::invalid_operation(
            "apply_effects needs at least one effect",
        ));
    }
    let has_audio = probe.has_audio(input)?;
    if !audio.is_empty() && !has_audio {
        return Err(EditorError::invalid_operation(format!(
            "{} has no audio stream for audio effects",
            input
        )));
    }

    let mut graph = FilterGraphBuilder::new();
    let mut outputs = Vec::with_capacity(2);
    if !video.is_empty() {
        outputs.push(graph.apply_chain(Pad::video(0), video)?);
    }
    if !audio.is_empty() {
        outputs.push(graph.apply_chain(Pad::audio(0), audio)?);
    }
    tracing::debug!(
        "Effect chains: {} video, {} audio -> {} node(s)",
        video.len(),
        audio.len(),
        graph.len()
    );

    let mut builder = ffmpeg(settings)
        .input(input.clone())
        .filter_graph(graph.finish(outputs)?)
        .map_outputs();

    builder = if video.is_empty() {
        builder.map(Pad::video(0)).option("-c:v", "copy")
    } else {
        builder.option("-c:v", &settings.encoding.video_codec)
    };
    builder = if !audio.is_empty() {
        audio_encoding(builder, settings)
    } else if has_audio {
        builder.map(Pad::audio(0)).option("-c:a", "copy")
    } else {
        builder
    };
    finish(builder, settings, output)
}

pub(super) fn picture_in_picture(
    settings: &Settings,
    main: &MediaAsset,
    overlay: &MediaAsset,
    position: Position,
    output: &MediaAsset,
) -> EditorResult<Command> {
    let mut graph = FilterGraphBuilder::new();
    let quarter = FilterRequest::new(
        StreamKind::Video,
        FilterStage::new("scale")
            .param("w", "iw/4")
            .param("h", "ih/4"),
        1,
    )
    .input(Pad::video(1));
    let scaled = graph.push(quarter)?;

    let (x, y) = position.overlay_xy(PIP_MARGIN);
    let composed = graph.apply(&Effect::Overlay { x, y }, &[Pad::video(0), scaled.into()])?;

    let builder = ffmpeg(settings)
        .input(main.clone())
        .input(overlay.clone())
        .filter_graph(graph.finish([composed])?)
        .map_outputs()
        .map_optional(Pad::audio(0))
        .option("-c:v", &settings.encoding.video_codec)
        .option("-c:a", "copy");
    finish(builder, settings, output)
}

pub(super) fn export(
    settings: &Settings,
    input: &MediaAsset,
    profile: &ExportProfile,
    output: &MediaAsset,
) -> EditorResult<Command> {
    let mut chain = vec![Effect::Scale {
        width: profile.width,
        height: profile.height,
    }];
    if let Some(fps) = profile.fps {
        chain.push(Effect::FrameRate { fps });
    }

    let mut graph = FilterGraphBuilder::new();
    let scaled = graph.apply_chain(Pad::video(0), &chain)?;

    let builder = ffmpeg(settings)
        .input(input.clone())
        .filter_graph(graph.finish([scaled])?)
        .map_outputs()
        .map_optional(Pad::audio(0))
        .option("-c:v", &settings.encoding.video_codec)
        .option("-b:v", &profile.video_bitrate)
        .option("-preset", &profile.preset);
    finish(audio_encoding(builder, settings), settings, output)
}
