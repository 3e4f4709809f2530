//! Timeline segmentation: trim a source into pieces and concatenate them.

mod concat;
mod types;

pub use concat::{build_concat, build_concat_with, ConcatError, SOURCE_INPUT};
pub use types::{parse_timestamp, Segment, SegmentError};
