//! Core enums used throughout the crate.

use serde::{Deserialize, Serialize};

/// Plane a stream or filter output belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    /// Single-letter specifier used by ffmpeg (`0:v`, `1:a`) and by
    /// generated labels (`v0`, `a3`).
    pub fn specifier(&self) -> char {
        match self {
            StreamKind::Video => 'v',
            StreamKind::Audio => 'a',
        }
    }

    /// Parse a specifier letter back into a kind.
    pub fn from_specifier(c: char) -> Option<Self> {
        match c {
            'v' => Some(StreamKind::Video),
            'a' => Some(StreamKind::Audio),
            _ => None,
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamKind::Video => write!(f, "video"),
            StreamKind::Audio => write!(f, "audio"),
        }
    }
}
