//! Filter graph building blocks: labels, pads, stages, nodes.
//!
//! Nodes and graphs have private fields and are only produced by
//! [`FilterGraphBuilder`](super::FilterGraphBuilder), which is what keeps
//! the acyclic and unique-label invariants true for every value in
//! circulation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::escape::escape_value;
use crate::models::StreamKind;

/// Name of an intermediate output pad (`v0`, `a3`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label {
    kind: StreamKind,
    index: usize,
}

impl Label {
    /// Create a label. Only labels handed out by a builder are valid inputs
    /// to that builder.
    pub fn new(kind: StreamKind, index: usize) -> Self {
        Self { kind, index }
    }

    /// Plane of the pad.
    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Position in the per-plane allocation order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Parse `v0` / `a12` (brackets optional).
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim_start_matches('[').trim_end_matches(']');
        let mut chars = text.chars();
        let kind = StreamKind::from_specifier(chars.next()?)?;
        let digits = chars.as_str();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(Self::new(kind, digits.parse().ok()?))
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.kind.specifier(), self.index)
    }
}

/// Something a filter can read from: a raw input stream or a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pad {
    /// Stream of the N-th `-i` input (`0:v`, `1:a`).
    Stream { input: usize, kind: StreamKind },
    /// Output of an earlier filter node.
    Label(Label),
}

impl Pad {
    /// Primary video stream of input `input`.
    pub fn video(input: usize) -> Self {
        Pad::Stream {
            input,
            kind: StreamKind::Video,
        }
    }

    /// Primary audio stream of input `input`.
    pub fn audio(input: usize) -> Self {
        Pad::Stream {
            input,
            kind: StreamKind::Audio,
        }
    }

    /// Plane of the pad.
    pub fn kind(&self) -> StreamKind {
        match self {
            Pad::Stream { kind, .. } => *kind,
            Pad::Label(label) => label.kind(),
        }
    }

    /// Input index for raw stream pads.
    pub fn input_index(&self) -> Option<usize> {
        match self {
            Pad::Stream { input, .. } => Some(*input),
            Pad::Label(_) => None,
        }
    }

    /// Form used inside a graph description: always bracketed.
    pub fn to_graph_pad(&self) -> String {
        format!("[{}]", self)
    }

    /// Form used as a `-map` value: raw streams bare, labels bracketed.
    pub fn to_map_arg(&self) -> String {
        match self {
            Pad::Stream { .. } => self.to_string(),
            Pad::Label(_) => self.to_graph_pad(),
        }
    }
}

impl From<Label> for Pad {
    fn from(label: Label) -> Self {
        Pad::Label(label)
    }
}

impl std::fmt::Display for Pad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pad::Stream { input, kind } => write!(f, "{}:{}", input, kind.specifier()),
            Pad::Label(label) => write!(f, "{}", label),
        }
    }
}

/// One filter invocation with ordered `key=value` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStage {
    name: String,
    params: Vec<(String, String)>,
}

impl FilterStage {
    /// Create a stage with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Append a parameter. Order is kept as given.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Filter name (e.g. `trim`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameters in serialization order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Look up a parameter value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Render as `name=k=v:k=v` with every value escaped.
    pub fn to_graph_text(&self) -> String {
        if self.params.is_empty() {
            return self.name.clone();
        }
        let params: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, escape_value(v)))
            .collect();
        format!("{}={}", self.name, params.join(":"))
    }
}

/// A node of the graph: one or more stages chained on a single pad.
///
/// The first stage is the node's primary filter; later stages run on its
/// output before the result is published under `label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterNode {
    label: Label,
    stages: Vec<FilterStage>,
    inputs: Vec<Pad>,
}

impl FilterNode {
    pub(crate) fn new(label: Label, stages: Vec<FilterStage>, inputs: Vec<Pad>) -> Self {
        Self {
            label,
            stages,
            inputs,
        }
    }

    /// Label of the node's output pad.
    pub fn label(&self) -> Label {
        self.label
    }

    /// Same as [`label`](Self::label), as a pad other nodes can consume.
    pub fn output(&self) -> Pad {
        Pad::Label(self.label)
    }

    /// Name of the primary filter.
    pub fn filter_name(&self) -> &str {
        self.stages[0].name()
    }

    /// Parameters of the primary filter.
    pub fn params(&self) -> &[(String, String)] {
        self.stages[0].params()
    }

    /// All stages, primary first.
    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    /// Input pads in link order.
    pub fn inputs(&self) -> &[Pad] {
        &self.inputs
    }

    /// Render as `[in]...stage,stage[out]`.
    pub fn to_graph_text(&self) -> String {
        let inputs: String = self.inputs.iter().map(Pad::to_graph_pad).collect();
        let stages: Vec<String> = self.stages.iter().map(FilterStage::to_graph_text).collect();
        format!("{}{}[{}]", inputs, stages.join(","), self.label)
    }
}

/// A compiled filter graph plus the labels to map into the output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterGraph {
    nodes: Vec<FilterNode>,
    outputs: Vec<Label>,
}

impl FilterGraph {
    pub(crate) fn new(nodes: Vec<FilterNode>, outputs: Vec<Label>) -> Self {
        Self { nodes, outputs }
    }

    /// Nodes in program order.
    pub fn nodes(&self) -> &[FilterNode] {
        &self.nodes
    }

    /// Final output labels in mapping order.
    pub fn outputs(&self) -> &[Label] {
        &self.outputs
    }

    /// First output label of the given plane.
    pub fn output(&self, kind: StreamKind) -> Option<Label> {
        self.outputs.iter().copied().find(|l| l.kind() == kind)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the graph has no nodes (never the case for a finished graph).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes whose primary filter is `name`.
    pub fn nodes_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FilterNode> + 'a {
        self.nodes.iter().filter(move |n| n.filter_name() == name)
    }

    /// Indices of `-i` inputs referenced through raw stream pads.
    pub fn referenced_inputs(&self) -> BTreeSet<usize> {
        self.nodes
            .iter()
            .flat_map(|n| n.inputs().iter())
            .filter_map(Pad::input_index)
            .collect()
    }

    /// The `-filter_complex` argument.
    pub fn to_filter_string(&self) -> String {
        let chains: Vec<String> = self.nodes.iter().map(FilterNode::to_graph_text).collect();
        chains.join(";")
    }
}

impl std::fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_filter_string())
    }
}
