//! Filter graph compiler.
//!
//! Turns an ordered list of filter requests into a [`FilterGraph`]:
//!
//! ```text
//! request 0: [0:v] trim,setpts      -> v0
//! request 1: [0:v] trim,setpts      -> v1
//! request 2: [v0][v1] concat        -> v2
//! outputs:   [v2]
//! ```
//!
//! Labels come from per-plane counters that only ever increase, and a
//! request may only name labels that already exist. That makes every graph
//! acyclic by construction; nothing is validated after the fact.

use std::collections::HashSet;

use super::effects::Effect;
use super::error::{GraphError, GraphResult};
use super::escape::is_identifier;
use super::node::{FilterGraph, FilterNode, FilterStage, Label, Pad};
use crate::models::StreamKind;

/// One declarative step: stages to chain, the plane they output, how many
/// inputs they consume, and which pads feed them.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRequest {
    kind: StreamKind,
    stages: Vec<FilterStage>,
    arity: usize,
    inputs: Vec<Pad>,
}

impl FilterRequest {
    /// Start a request with its primary stage.
    pub fn new(kind: StreamKind, stage: FilterStage, arity: usize) -> Self {
        Self {
            kind,
            stages: vec![stage],
            arity,
            inputs: Vec::new(),
        }
    }

    /// Chain another stage on the same pad.
    pub fn then(mut self, stage: FilterStage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Add an input pad.
    pub fn input(mut self, pad: impl Into<Pad>) -> Self {
        self.inputs.push(pad.into());
        self
    }

    /// Add several input pads in order.
    pub fn inputs(mut self, pads: impl IntoIterator<Item = Pad>) -> Self {
        self.inputs.extend(pads);
        self
    }

    /// Plane of the produced output.
    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    fn primary_name(&self) -> &str {
        self.stages[0].name()
    }
}

/// Incremental graph builder.
#[derive(Debug, Default)]
pub struct FilterGraphBuilder {
    nodes: Vec<FilterNode>,
    next_video: usize,
    next_audio: usize,
    consumed: HashSet<Label>,
}

impl FilterGraphBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes added so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no node has been added.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `label` was handed out by this builder.
    pub fn is_allocated(&self, label: Label) -> bool {
        label.index() < self.counter(label.kind())
    }

    /// Whether `label` already feeds a node.
    pub fn is_consumed(&self, label: Label) -> bool {
        self.consumed.contains(&label)
    }

    /// Append a request and return the label of its output.
    ///
    /// The builder is left untouched when an error is returned.
    pub fn push(&mut self, request: FilterRequest) -> GraphResult<Label> {
        for stage in &request.stages {
            validate_stage(stage)?;
        }

        if request.inputs.len() != request.arity {
            return Err(GraphError::ArityMismatch {
                filter: request.primary_name().to_string(),
                expected: request.arity,
                found: request.inputs.len(),
            });
        }

        let mut claimed = HashSet::new();
        for pad in &request.inputs {
            if let Pad::Label(label) = pad {
                if !self.is_allocated(*label) {
                    return Err(GraphError::UnknownLabel(*label));
                }
                if self.is_consumed(*label) || !claimed.insert(*label) {
                    return Err(GraphError::LabelConsumed(*label));
                }
            }
        }

        let label = self.allocate(request.kind);
        self.consumed.extend(claimed);

        tracing::trace!(
            "graph node [{}] <- {} ({} input(s))",
            label,
            request.primary_name(),
            request.inputs.len()
        );

        self.nodes
            .push(FilterNode::new(label, request.stages, request.inputs));
        Ok(label)
    }

    /// Append a typed effect fed by `inputs`.
    pub fn apply(&mut self, effect: &Effect, inputs: &[Pad]) -> GraphResult<Label> {
        let request = effect.to_request(inputs)?;
        self.push(request)
    }

    /// Chain several single-input effects of one plane into one node.
    pub fn apply_chain(&mut self, input: Pad, effects: &[Effect]) -> GraphResult<Label> {
        let Some(first) = effects.first() else {
            return Err(GraphError::EmptyChain);
        };

        let mut stages = Vec::new();
        for effect in effects {
            if effect.arity() != 1 {
                return Err(GraphError::ArityMismatch {
                    filter: effect.name().to_string(),
                    expected: effect.arity(),
                    found: 1,
                });
            }
            if effect.kind() != input.kind() {
                return Err(GraphError::PlaneMismatch {
                    filter: effect.name().to_string(),
                    expected: effect.kind(),
                    found: input.kind(),
                });
            }
            stages.extend(effect.stages()?);
        }

        let mut stages = stages.into_iter();
        let Some(primary) = stages.next() else {
            return Err(GraphError::EmptyChain);
        };
        let request = stages.fold(
            FilterRequest::new(first.kind(), primary, 1).input(input),
            FilterRequest::then,
        );
        self.push(request)
    }

    /// Close the graph with the labels to map into the output.
    ///
    /// Every produced label must end up either consumed by a node or listed
    /// here; ffmpeg refuses graphs with dangling pads.
    pub fn finish(self, outputs: impl IntoIterator<Item = Label>) -> GraphResult<FilterGraph> {
        if self.nodes.is_empty() {
            return Err(GraphError::EmptyGraph);
        }

        let outputs: Vec<Label> = outputs.into_iter().collect();
        if outputs.is_empty() {
            return Err(GraphError::NoOutputs);
        }

        let mut used = self.consumed.clone();
        for label in &outputs {
            if !self.is_allocated(*label) {
                return Err(GraphError::UnknownLabel(*label));
            }
            if !used.insert(*label) {
                return Err(GraphError::LabelConsumed(*label));
            }
        }

        if let Some(node) = self.nodes.iter().find(|n| !used.contains(&n.label())) {
            return Err(GraphError::UnusedLabel(node.label()));
        }

        Ok(FilterGraph::new(self.nodes, outputs))
    }

    fn counter(&self, kind: StreamKind) -> usize {
        match kind {
            StreamKind::Video => self.next_video,
            StreamKind::Audio => self.next_audio,
        }
    }

    fn allocate(&mut self, kind: StreamKind) -> Label {
        let slot = match kind {
            StreamKind::Video => &mut self.next_video,
            StreamKind::Audio => &mut self.next_audio,
        };
        let label = Label::new(kind, *slot);
        *slot += 1;
        label
    }
}

/// Compile a full request list in one go.
pub fn compile(
    requests: impl IntoIterator<Item = FilterRequest>,
    outputs: &[Label],
) -> GraphResult<FilterGraph> {
    let mut builder = FilterGraphBuilder::new();
    for request in requests {
        builder.push(request)?;
    }
    builder.finish(outputs.iter().copied())
}

fn validate_stage(stage: &FilterStage) -> GraphResult<()> {
    if !is_identifier(stage.name()) {
        return Err(GraphError::InvalidName(stage.name().to_string()));
    }
    for (key, _) in stage.params() {
        if !is_identifier(key) {
            return Err(GraphError::InvalidName(key.clone()));
        }
    }
    Ok(())
}
