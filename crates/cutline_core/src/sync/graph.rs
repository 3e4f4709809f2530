//! Filter graph for laying an external audio track onto a video.
//!
//! Input 0 is the target video, input 1 the external audio.
//!
//! ```text
//! with target audio:    [1:a]adelay[a0]; [0:a][a0]amix,volume[a1]
//! without target audio: [1:a]adelay[a0]
//! ```
//!
//! `amix` halves each input, so the mix is brought back up with `volume=2.0`.

use crate::graph::{
    Effect, FilterGraph, FilterGraphBuilder, FilterStage, GraphResult, MixDuration, Pad,
};

/// Input index of the target video.
pub const TARGET_INPUT: usize = 0;
/// Input index of the external audio.
pub const EXTERNAL_AUDIO_INPUT: usize = 1;

/// Build the sync graph. The single output label is the audio to map.
///
/// Negative delays are treated as zero.
pub fn build_sync_graph(delay_ms: i64, target_has_audio: bool) -> GraphResult<FilterGraph> {
    let mut builder = FilterGraphBuilder::new();

    let delay = Effect::Delay {
        milliseconds: delay_ms.max(0).unsigned_abs(),
    };
    let delayed = builder.apply(&delay, &[Pad::audio(EXTERNAL_AUDIO_INPUT)])?;

    if !target_has_audio {
        return builder.finish([delayed]);
    }

    let mix = Effect::Mix {
        inputs: 2,
        duration: MixDuration::First,
    };
    let request = mix
        .to_request(&[Pad::audio(TARGET_INPUT), delayed.into()])?
        .then(FilterStage::new("volume").param("volume", "2.0"));
    let mixed = builder.push(request)?;

    builder.finish([mixed])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StreamKind;

    #[test]
    fn test_mixes_with_target_audio() {
        let graph = build_sync_graph(1150, true).unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(
            graph.to_filter_string(),
            "[1:a]adelay=delays=1150|1150[a0];\
             [0:a][a0]amix=inputs=2:duration=first,volume=volume=2.0[a1]"
        );
        assert_eq!(graph.output(StreamKind::Audio).unwrap().to_string(), "a1");
    }

    #[test]
    fn test_delayed_audio_alone_without_target_audio() {
        let graph = build_sync_graph(1150, false).unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.nodes_named("amix").count(), 0);
        assert_eq!(graph.to_filter_string(), "[1:a]adelay=delays=1150|1150[a0]");
        assert_eq!(graph.outputs().len(), 1);
    }

    #[test]
    fn test_negative_delay_is_zero() {
        let graph = build_sync_graph(-20, false).unwrap();
        assert_eq!(graph.nodes()[0].params()[0].1, "0|0");
    }
}
