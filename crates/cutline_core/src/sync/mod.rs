//! Audio/video synchronization: delay math and the sync filter graph.

mod graph;
mod offset;

pub use graph::{build_sync_graph, EXTERNAL_AUDIO_INPUT, TARGET_INPUT};
pub use offset::{compute_delay, format_delay, SyncSummary};
