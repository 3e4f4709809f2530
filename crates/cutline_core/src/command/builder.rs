//! ffmpeg argument vector builder.
//!
//! Arguments are emitted in a fixed order:
//!
//! ```text
//! ffmpeg [-hide_banner] [-y|-n] <global> -i <in>... [-filter_complex <graph>]
//!        -map <pad>... <codec options> <output>
//! ```
//!
//! Inputs are numbered in the order they are added, which is the numbering
//! raw pads (`0:v`, `1:a`) in the graph and maps refer to.

use std::collections::HashSet;

use super::types::{Command, CommandError};
use crate::graph::{FilterGraph, Label, Pad};
use crate::models::MediaAsset;

#[derive(Debug, Clone, Copy, PartialEq)]
struct MapEntry {
    pad: Pad,
    optional: bool,
}

/// Builder for one ffmpeg invocation.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    executable: String,
    hide_banner: bool,
    overwrite: bool,
    global: Vec<String>,
    inputs: Vec<MediaAsset>,
    graph: Option<FilterGraph>,
    maps: Vec<MapEntry>,
    options: Vec<String>,
}

impl CommandBuilder {
    /// Create a builder for `executable` (usually `ffmpeg`).
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            hide_banner: true,
            overwrite: true,
            global: Vec::new(),
            inputs: Vec::new(),
            graph: None,
            maps: Vec::new(),
            options: Vec::new(),
        }
    }

    /// Emit `-hide_banner` (on by default).
    pub fn hide_banner(mut self, hide: bool) -> Self {
        self.hide_banner = hide;
        self
    }

    /// `-y` when true (default), `-n` when false.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Extra global flag placed before the inputs.
    pub fn global_flag(mut self, flag: impl Into<String>) -> Self {
        self.global.push(flag.into());
        self
    }

    /// Add an input. Its index is the number of inputs added before it.
    pub fn input(mut self, asset: impl Into<MediaAsset>) -> Self {
        self.inputs.push(asset.into());
        self
    }

    /// Number of inputs added so far.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Set the `-filter_complex` graph.
    pub fn filter_graph(mut self, graph: FilterGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Map a pad into the output.
    pub fn map(mut self, pad: impl Into<Pad>) -> Self {
        self.maps.push(MapEntry {
            pad: pad.into(),
            optional: false,
        });
        self
    }

    /// Map a raw stream if it exists (`-map 0:a?`).
    pub fn map_optional(mut self, pad: impl Into<Pad>) -> Self {
        self.maps.push(MapEntry {
            pad: pad.into(),
            optional: true,
        });
        self
    }

    /// Map every output of the filter graph, in graph order.
    pub fn map_outputs(mut self) -> Self {
        let labels: Vec<Label> = self
            .graph
            .as_ref()
            .map(|g| g.outputs().to_vec())
            .unwrap_or_default();
        for label in labels {
            self = self.map(label);
        }
        self
    }

    /// Output option with a value (`-c:a aac`).
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push(key.into());
        self.options.push(value.into());
        self
    }

    /// Output flag without a value.
    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.options.push(flag.into());
        self
    }

    /// Validate and produce the command writing to `output`.
    pub fn build(self, output: impl Into<MediaAsset>) -> Result<Command, CommandError> {
        let output = output.into();

        if self.inputs.is_empty() {
            return Err(CommandError::NoInputs);
        }
        if self.inputs.iter().any(|i| i.path() == output.path()) {
            return Err(CommandError::OutputIsInput(output.to_string()));
        }

        if let Some(graph) = &self.graph {
            if let Some(&index) = graph.referenced_inputs().iter().find(|&&i| i >= self.inputs.len()) {
                return Err(self.missing_input(index));
            }
        }

        let mut mapped = HashSet::new();
        for entry in &self.maps {
            match entry.pad {
                Pad::Stream { input, .. } => {
                    if input >= self.inputs.len() {
                        return Err(self.missing_input(input));
                    }
                }
                Pad::Label(label) => {
                    let Some(graph) = &self.graph else {
                        return Err(CommandError::NoFilterGraph(label.to_string()));
                    };
                    if !graph.outputs().contains(&label) {
                        return Err(CommandError::UnknownMap(label.to_string()));
                    }
                    mapped.insert(label);
                }
            }
        }
        if let Some(graph) = &self.graph {
            if let Some(label) = graph.outputs().iter().find(|l| !mapped.contains(l)) {
                return Err(CommandError::UnmappedOutput(label.to_string()));
            }
        }

        let mut args = Vec::new();
        if self.hide_banner {
            args.push("-hide_banner".to_string());
        }
        args.push(if self.overwrite { "-y" } else { "-n" }.to_string());
        args.extend(self.global);

        for input in &self.inputs {
            args.push("-i".to_string());
            args.push(input.to_arg());
        }

        if let Some(graph) = &self.graph {
            args.push("-filter_complex".to_string());
            args.push(graph.to_filter_string());
        }

        for entry in &self.maps {
            args.push("-map".to_string());
            let mut value = entry.pad.to_map_arg();
            if entry.optional && matches!(entry.pad, Pad::Stream { .. }) {
                value.push('?');
            }
            args.push(value);
        }

        args.extend(self.options);
        args.push(output_arg(&output));

        let command = Command::new(self.executable, args, output.path());
        tracing::debug!("Built command: {}", command);
        Ok(command)
    }

    fn missing_input(&self, index: usize) -> CommandError {
        CommandError::MissingInput {
            index,
            available: self.inputs.len(),
        }
    }
}

/// The output is the only positional argument; keep a relative path that
/// starts with `-` from being read as an option.
fn output_arg(output: &MediaAsset) -> String {
    let arg = output.to_arg();
    if arg.starts_with('-') {
        format!("./{arg}")
    } else {
        arg
    }
}
