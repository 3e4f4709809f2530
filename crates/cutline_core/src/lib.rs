//! Cutline Core - ffmpeg filter-graph compiler and A/V sync engine
//!
//! Editing requests are compiled into validated ffmpeg invocations: typed
//! effects become filter graphs with unique labels, segment lists become
//! trim/concat graphs, and external audio is aligned to a video by comparing
//! first presentation timestamps. Commands run without a shell, with a
//! timeout and captured output.
//!
//! ```no_run
//! use cutline_core::{MediaEditor, Operation, Settings};
//!
//! let editor = MediaEditor::new(Settings::default());
//! let op = Operation::SyncAudio {
//!     video: "talk.mp4".into(),
//!     audio: "voice.wav".into(),
//!     manual_offset: 0.0,
//! };
//! let result = editor.run(&op, "talk_synced.mp4").unwrap();
//! assert!(result.succeeded);
//! ```

pub mod command;
pub mod config;
pub mod editor;
pub mod graph;
pub mod logging;
pub mod models;
pub mod operations;
pub mod probe;
pub mod segments;
pub mod sync;

pub use command::{Command, CommandBuilder, CommandExecutor, ExecutionResult, FailureKind};
pub use config::{ConfigManager, Settings};
pub use editor::{EditorError, EditorResult, MediaEditor};
pub use graph::{Effect, FilterGraph, FilterGraphBuilder};
pub use models::{MediaAsset, StreamKind};
pub use operations::Operation;
pub use probe::{FfprobeClient, MediaProbe};
pub use segments::Segment;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
