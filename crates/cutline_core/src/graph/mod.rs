//! Filter graph compiler.
//!
//! Requests go in as ordered lists of stages and pads; a [`FilterGraph`]
//! with unique, monotonically allocated labels comes out. The graph's
//! string form is passed to ffmpeg as `-filter_complex`.

mod builder;
pub mod effects;
mod error;
pub mod escape;
mod node;

pub use builder::{compile, FilterGraphBuilder, FilterRequest};
pub use effects::{Effect, FadeDirection, MixDuration};
pub use error::{GraphError, GraphResult};
pub use node::{FilterGraph, FilterNode, FilterStage, Label, Pad};
