//! ffmpeg command construction and execution.
//!
//! # Architecture
//!
//! - **builder**: turns inputs, a filter graph, maps and codec options into a [`Command`]
//! - **executor**: runs a [`Command`] and classifies the outcome

mod builder;
mod executor;
mod types;

pub use builder::CommandBuilder;
pub use executor::{is_available, CommandExecutor};
pub use types::{
    format_tokens_pretty, Command, CommandError, ExecutionFailure, ExecutionResult, FailureKind,
};
