//! Audio operations: sync, mix, background music, fades, extraction.

use serde::{Deserialize, Serialize};

use super::{audio_encoding, check_seconds, ffmpeg, finish};
use crate::command::Command;
use crate::config::Settings;
use crate::editor::{EditorError, EditorResult};
use crate::graph::{Effect, FadeDirection, FilterGraphBuilder, MixDuration, Pad};
use crate::models::{MediaAsset, StreamKind};
use crate::probe::MediaProbe;
use crate::sync::{build_sync_graph, SyncSummary, TARGET_INPUT};

/// One input of a mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTrack {
    pub input: MediaAsset,
    #[serde(default = "unity")]
    pub volume: f64,
}

fn unity() -> f64 {
    1.0
}

impl AudioTrack {
    pub fn new(input: impl Into<MediaAsset>, volume: f64) -> Self {
        Self {
            input: input.into(),
            volume,
        }
    }
}

pub(super) fn sync_audio(
    probe: &dyn MediaProbe,
    settings: &Settings,
    video: &MediaAsset,
    audio: &MediaAsset,
    manual_offset: f64,
    output: &MediaAsset,
) -> EditorResult<Command> {
    if !manual_offset.is_finite() {
        return Err(EditorError::invalid_operation(format!(
            "manual offset must be finite, got {}",
            manual_offset
        )));
    }

    let video_start = probe.first_pts(video, StreamKind::Video)?;
    let audio_start = probe.first_pts(audio, StreamKind::Audio)?;
    let target_has_audio = probe.has_audio(video)?;

    let summary = SyncSummary::calculate(video_start, audio_start, manual_offset);
    let graph = build_sync_graph(summary.delay_ms, target_has_audio)?;

    let builder = ffmpeg(settings)
        .input(video.clone())
        .input(audio.clone())
        .filter_graph(graph)
        .map(Pad::video(TARGET_INPUT))
        .map_outputs()
        .option("-c:v", "copy");
    finish(audio_encoding(builder, settings), settings, output)
}

/// Drop the video and re-encode the first input's audio.
pub(super) fn extract_audio(
    probe: &dyn MediaProbe,
    settings: &Settings,
    input: &MediaAsset,
    output: &MediaAsset,
) -> EditorResult<Command> {
    if !probe.has_audio(input)? {
        return Err(EditorError::invalid_operation(format!(
            "{} has no audio stream to extract",
            input
        )));
    }

    let builder = ffmpeg(settings)
        .input(input.clone())
        .map(Pad::audio(0))
        .flag("-vn");
    finish(audio_encoding(builder, settings), settings, output)
}

pub(super) fn mix_audio(
    settings: &Settings,
    tracks: &[AudioTrack],
    output: &MediaAsset,
) -> EditorResult<Command> {
    if tracks.is_empty() {
        return Err(EditorError::invalid_operation(
            "mix needs at least one track",
        ));
    }

    let mut graph = FilterGraphBuilder::new();
    let mut levelled = Vec::with_capacity(tracks.len());
    for (index, track) in tracks.iter().enumerate() {
        let volume = Effect::Volume {
            factor: track.volume,
        };
        levelled.push(Pad::from(graph.apply(&volume, &[Pad::audio(index)])?));
    }
    let mix = Effect::Mix {
        inputs: tracks.len(),
        duration: MixDuration::Longest,
    };
    let mixed = graph.apply(&mix, &levelled)?;

    let builder = tracks
        .iter()
        .fold(ffmpeg(settings), |b, track| b.input(track.input.clone()))
        .filter_graph(graph.finish([mixed])?)
        .map_outputs();
    finish(audio_encoding(builder, settings), settings, output)
}

/// Music is levelled, faded in at the start and faded out so that it ends
/// with the video. When the video has its own audio the music is mixed under
/// it for the video's length; otherwise the music becomes the soundtrack and
/// the output stops with the shorter stream.
pub(super) fn background_music(
    probe: &dyn MediaProbe,
    settings: &Settings,
    video: &MediaAsset,
    music: &MediaAsset,
    volume: f64,
    fade: f64,
    output: &MediaAsset,
) -> EditorResult<Command> {
    check_seconds("fade", fade)?;

    let duration = probe.duration(video)?;
    let video_has_audio = probe.has_audio(video)?;

    let mut chain = vec![Effect::Volume { factor: volume }];
    if fade > 0.0 {
        chain.push(Effect::AudioFade {
            direction: FadeDirection::In,
            start: 0.0,
            duration: fade,
        });
        chain.push(Effect::AudioFade {
            direction: FadeDirection::Out,
            start: (duration - fade).max(0.0),
            duration: fade,
        });
    }

    let mut graph = FilterGraphBuilder::new();
    let bed = graph.apply_chain(Pad::audio(1), &chain)?;
    let soundtrack = if video_has_audio {
        let mix = Effect::Mix {
            inputs: 2,
            duration: MixDuration::First,
        };
        graph.apply(&mix, &[Pad::audio(0), bed.into()])?
    } else {
        bed
    };

    let builder = ffmpeg(settings)
        .input(video.clone())
        .input(music.clone())
        .filter_graph(graph.finish([soundtrack])?)
        .map(Pad::video(0))
        .map_outputs()
        .option("-c:v", "copy");
    let builder = audio_encoding(builder, settings);
    let builder = if video_has_audio {
        builder
    } else {
        builder.flag("-shortest")
    };
    finish(builder, settings, output)
}

/// The fade-out ends at the probed duration; a fade longer than the media
/// starts at zero.
pub(super) fn fade_audio(
    probe: &dyn MediaProbe,
    settings: &Settings,
    input: &MediaAsset,
    fade_in: f64,
    fade_out: f64,
    output: &MediaAsset,
) -> EditorResult<Command> {
    check_seconds("fade_in", fade_in)?;
    check_seconds("fade_out", fade_out)?;
    if fade_in == 0.0 && fade_out == 0.0 {
        return Err(EditorError::invalid_operation(
            "fade_audio needs a fade_in or fade_out longer than zero",
        ));
    }
    if !probe.has_audio(input)? {
        return Err(EditorError::invalid_operation(format!(
            "{} has no audio stream to fade",
            input
        )));
    }

    let mut chain = Vec::new();
    if fade_in > 0.0 {
        chain.push(Effect::AudioFade {
            direction: FadeDirection::In,
            start: 0.0,
            duration: fade_in,
        });
    }
    if fade_out > 0.0 {
        let duration = probe.duration(input)?;
        chain.push(Effect::AudioFade {
            direction: FadeDirection::Out,
            start: (duration - fade_out).max(0.0),
            duration: fade_out,
        });
    }

    let mut graph = FilterGraphBuilder::new();
    let faded = graph.apply_chain(Pad::audio(0), &chain)?;

    let builder = ffmpeg(settings)
        .input(input.clone())
        .filter_graph(graph.finish([faded])?)
        .map_optional(Pad::video(0))
        .map_outputs()
        .option("-c:v", "copy");
    finish(audio_encoding(builder, settings), settings, output)
}
