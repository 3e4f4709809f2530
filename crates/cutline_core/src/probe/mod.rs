//! Media probing: duration, first PTS and audio presence.

#[cfg(test)]
pub(crate) mod fake;
mod ffprobe;
mod types;

pub use ffprobe::{
    duration_args, first_pts_args, has_audio_args, parse_duration, parse_first_pts,
    parse_has_audio, FfprobeClient,
};
pub use types::{MediaProbe, ProbeError, ProbeResult};
