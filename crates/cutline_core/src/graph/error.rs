//! Error types for filter-graph compilation.
//!
//! These are compile-time faults: they point at a bug in the caller's
//! request list and are never worth retrying.

use thiserror::Error;

use super::node::Label;
use crate::models::StreamKind;

/// Structural fault found while building a filter graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// A request referenced a label no earlier node produced.
    #[error("Unknown label [{0}]: no earlier filter produces it")]
    UnknownLabel(Label),

    /// A graph was required but no filter was added.
    #[error("Filter graph is empty")]
    EmptyGraph,

    /// A graph was finished without any output to map.
    #[error("Filter graph has no output labels")]
    NoOutputs,

    /// An intermediate label was linked to more than one consumer.
    #[error("Label [{0}] is already consumed by another filter or output")]
    LabelConsumed(Label),

    /// A produced label is neither consumed nor mapped as an output.
    #[error("Label [{0}] is produced but never used")]
    UnusedLabel(Label),

    /// The number of inputs given does not match the filter's declared arity.
    #[error("Filter '{filter}' consumes {expected} input(s) but {found} were given")]
    ArityMismatch {
        filter: String,
        expected: usize,
        found: usize,
    },

    /// A filter name or parameter key is not a plain identifier.
    #[error("Invalid filter or parameter name '{0}'")]
    InvalidName(String),

    /// A parameter value is outside what the filter accepts.
    #[error("Invalid parameter for '{filter}': {message}")]
    InvalidParameter { filter: String, message: String },

    /// An input pad belongs to the wrong plane for the filter.
    #[error("Filter '{filter}' expects {expected} input but got {found}")]
    PlaneMismatch {
        filter: String,
        expected: StreamKind,
        found: StreamKind,
    },

    /// A chain was requested with no effects in it.
    #[error("Effect chain is empty")]
    EmptyChain,
}

impl GraphError {
    /// Create an invalid parameter error.
    pub fn invalid_parameter(filter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            filter: filter.into(),
            message: message.into(),
        }
    }
}

/// Result type for graph compilation.
pub type GraphResult<T> = Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_label_names_the_pad() {
        let err = GraphError::UnknownLabel(Label::new(StreamKind::Video, 7));
        assert!(err.to_string().contains("[v7]"));
    }

    #[test]
    fn arity_mismatch_displays_counts() {
        let err = GraphError::ArityMismatch {
            filter: "overlay".to_string(),
            expected: 2,
            found: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("overlay"));
        assert!(msg.contains("2 input(s)"));
    }
}
