//! Probe trait and error type.

use thiserror::Error;

use crate::models::{MediaAsset, StreamKind, StreamTiming};

/// Errors from media probing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("{0} not found; is it installed and on PATH?")]
    ToolNotFound(String),

    #[error("Failed to run {tool}: {message}")]
    Launch { tool: String, message: String },

    #[error("{tool} failed with exit code {exit_code}: {stderr}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("Failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    #[error("No {kind} stream in {path}")]
    MissingStream { kind: StreamKind, path: String },
}

impl ProbeError {
    /// Create a parse error.
    pub fn parse(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            what: what.into(),
            message: message.into(),
        }
    }
}

/// Result type for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Read-only timing queries against a media asset.
///
/// Every call hits the asset again; nothing is cached.
pub trait MediaProbe {
    /// Container duration in seconds.
    fn duration(&self, asset: &MediaAsset) -> ProbeResult<f64>;

    /// PTS of the first packet of the first stream of `kind`, in seconds.
    fn first_pts(&self, asset: &MediaAsset, kind: StreamKind) -> ProbeResult<f64>;

    /// Whether the asset has at least one audio stream.
    fn has_audio(&self, asset: &MediaAsset) -> ProbeResult<bool>;

    /// All three readings as one snapshot, with `first_pts` taken from the
    /// stream of `kind`.
    fn timing(&self, asset: &MediaAsset, kind: StreamKind) -> ProbeResult<StreamTiming> {
        Ok(StreamTiming::new(
            self.first_pts(asset, kind)?,
            self.has_audio(asset)?,
            self.duration(asset)?,
        ))
    }
}
