//! Media-related data structures (assets, timing snapshots).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// An input or output location handed to the engine.
///
/// The path is opaque: nothing here checks that it exists or what format
/// it holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaAsset(PathBuf);

impl MediaAsset {
    /// Create an asset from any path-like value.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Borrow the underlying path.
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Path as a string argument for the engine.
    pub fn to_arg(&self) -> String {
        self.0.to_string_lossy().to_string()
    }
}

impl From<&str> for MediaAsset {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<PathBuf> for MediaAsset {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<&Path> for MediaAsset {
    fn from(path: &Path) -> Self {
        Self(path.to_path_buf())
    }
}

impl std::fmt::Display for MediaAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Timing snapshot of one asset as reported by the probe.
///
/// Staleness is the caller's problem: nothing is cached or invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StreamTiming {
    /// First presentation timestamp in seconds.
    pub first_pts: f64,
    /// Whether any audio stream is present.
    pub has_audio: bool,
    /// Container duration in seconds.
    pub duration: f64,
}

impl StreamTiming {
    /// Create a snapshot, clamping negative or non-finite readings to zero.
    pub fn new(first_pts: f64, has_audio: bool, duration: f64) -> Self {
        Self {
            first_pts: non_negative(first_pts),
            has_audio,
            duration: non_negative(duration),
        }
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
