//! Cut a source into segments and join them back together.
//!
//! For N segments of input 0 the graph is:
//!
//! ```text
//! [0:v]trim=start=s:end=e,setpts=PTS-STARTPTS[v_i]     (one per segment)
//! [0:a]atrim=start=s:end=e,asetpts=PTS-STARTPTS[a_i]   (one per segment)
//! [v0]..[vN-1]concat=n=N:v=1:a=0[vN]
//! [a0]..[aN-1]concat=n=N:v=0:a=1[aN]
//! ```
//!
//! Segments are joined in the order given. Overlapping or out-of-order
//! segments are legal and produce repeated or reordered content.

use super::types::{Segment, SegmentError};
use crate::graph::{FilterGraph, FilterGraphBuilder, FilterRequest, FilterStage, Label, Pad};
use crate::models::StreamKind;

/// Input index of the source.
pub const SOURCE_INPUT: usize = 0;

/// Errors from [`build_concat`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConcatError {
    #[error(transparent)]
    Segment(#[from] SegmentError),

    #[error(transparent)]
    Graph(#[from] crate::graph::GraphError),
}

/// Build the segment graph for a source with both video and audio.
pub fn build_concat(segments: &[Segment]) -> Result<FilterGraph, ConcatError> {
    build_concat_with(segments, true)
}

/// Build the segment graph; with `include_audio == false` only the video
/// plane is cut and joined.
pub fn build_concat_with(
    segments: &[Segment],
    include_audio: bool,
) -> Result<FilterGraph, ConcatError> {
    if segments.is_empty() {
        return Err(SegmentError::Empty.into());
    }

    let mut builder = FilterGraphBuilder::new();

    let mut video = Vec::with_capacity(segments.len());
    for seg in segments {
        video.push(builder.push(trim_request(StreamKind::Video, seg))?);
    }
    let mut audio = Vec::with_capacity(segments.len());
    if include_audio {
        for seg in segments {
            audio.push(builder.push(trim_request(StreamKind::Audio, seg))?);
        }
    }

    let mut outputs = vec![builder.push(concat_request(StreamKind::Video, &video))?];
    if include_audio {
        outputs.push(builder.push(concat_request(StreamKind::Audio, &audio))?);
    }

    tracing::debug!(
        "Segment graph: {} segment(s), audio={} -> {} node(s)",
        segments.len(),
        include_audio,
        builder.len()
    );

    Ok(builder.finish(outputs)?)
}

fn trim_request(kind: StreamKind, seg: &Segment) -> FilterRequest {
    let (trim, setpts, pad) = match kind {
        StreamKind::Video => ("trim", "setpts", Pad::video(SOURCE_INPUT)),
        StreamKind::Audio => ("atrim", "asetpts", Pad::audio(SOURCE_INPUT)),
    };
    FilterRequest::new(
        kind,
        FilterStage::new(trim)
            .param("start", seg.start())
            .param("end", seg.end()),
        1,
    )
    .then(FilterStage::new(setpts).param("expr", "PTS-STARTPTS"))
    .input(pad)
}

fn concat_request(kind: StreamKind, labels: &[Label]) -> FilterRequest {
    let (v, a) = match kind {
        StreamKind::Video => (1, 0),
        StreamKind::Audio => (0, 1),
    };
    FilterRequest::new(
        kind,
        FilterStage::new("concat")
            .param("n", labels.len())
            .param("v", v)
            .param("a", a),
        labels.len(),
    )
    .inputs(labels.iter().copied().map(Pad::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(pairs: &[(f64, f64)]) -> Vec<Segment> {
        pairs
            .iter()
            .map(|&(s, e)| Segment::new(s, e).unwrap())
            .collect()
    }

    #[test]
    fn two_segments() {
        let graph = build_concat(&segs(&[(5.0, 10.0), (15.0, 20.0)])).unwrap();

        assert_eq!(graph.nodes_named("trim").count(), 2);
        assert_eq!(graph.nodes_named("atrim").count(), 2);
        assert_eq!(graph.nodes_named("concat").count(), 2);

        let video_concat = graph
            .nodes_named("concat")
            .find(|n| n.label().kind() == StreamKind::Video)
            .unwrap();
        let inputs: String = video_concat.inputs().iter().map(Pad::to_graph_pad).collect();
        assert_eq!(inputs, "[v0][v1]");
        assert_eq!(video_concat.params()[0], ("n".to_string(), "2".to_string()));

        assert_eq!(
            graph.to_filter_string(),
            "[0:v]trim=start=5:end=10,setpts=expr=PTS-STARTPTS[v0];\
             [0:v]trim=start=15:end=20,setpts=expr=PTS-STARTPTS[v1];\
             [0:a]atrim=start=5:end=10,asetpts=expr=PTS-STARTPTS[a0];\
             [0:a]atrim=start=15:end=20,asetpts=expr=PTS-STARTPTS[a1];\
             [v0][v1]concat=n=2:v=1:a=0[v2];\
             [a0][a1]concat=n=2:v=0:a=1[a2]"
        );
        let outputs: Vec<String> = graph.outputs().iter().map(|l| l.to_string()).collect();
        assert_eq!(outputs, vec!["v2", "a2"]);
    }

    #[test]
    fn concat_count_is_two_for_any_length() {
        for n in 1..=6 {
            let pairs: Vec<(f64, f64)> = (0..n)
                .map(|i| (i as f64 * 10.0, i as f64 * 10.0 + 3.0))
                .collect();
            let graph = build_concat(&segs(&pairs)).unwrap();
            assert_eq!(graph.nodes_named("concat").count(), 2);
            assert_eq!(graph.len(), 2 * n + 2);
        }
    }

    #[test]
    fn keeps_given_order() {
        let graph = build_concat(&segs(&[(30.0, 40.0), (0.0, 5.0)])).unwrap();
        let first = &graph.nodes()[0];
        assert_eq!(first.params()[0].1, "30");
        assert_eq!(graph.nodes()[1].params()[0].1, "0");
    }

    #[test]
    fn video_only_source() {
        let graph = build_concat_with(&segs(&[(0.0, 1.0), (2.0, 3.0)]), false).unwrap();
        assert_eq!(graph.nodes_named("atrim").count(), 0);
        assert_eq!(graph.nodes_named("concat").count(), 1);
        assert_eq!(graph.outputs().len(), 1);
        assert_eq!(graph.output(StreamKind::Audio), None);
    }

    #[test]
    fn empty_list_is_rejected() {
        assert_eq!(
            build_concat(&[]).unwrap_err(),
            ConcatError::Segment(SegmentError::Empty)
        );
    }
}
