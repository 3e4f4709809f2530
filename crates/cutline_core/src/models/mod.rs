//! Data models shared across the compiler, probe and executor.
//!
//! - Enums for stream kinds
//! - Media structures (assets, stream timing snapshots)

mod enums;
mod media;

pub use enums::StreamKind;
pub use media::{MediaAsset, StreamTiming};
