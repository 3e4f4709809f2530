//! Compile-and-run front end.
//!
//! [`MediaEditor`] ties the pieces together: it compiles an [`Operation`]
//! against the configured probe, logs the command to a per-operation log,
//! runs ffmpeg and reports the result.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::command::{
    is_available, Command, CommandError, CommandExecutor, ExecutionFailure, ExecutionResult,
};
use crate::config::{ConfigError, Settings};
use crate::graph::GraphError;
use crate::logging::{LogCallback, LogConfig, OperationLogger};
use crate::models::MediaAsset;
use crate::operations::Operation;
use crate::probe::{FfprobeClient, MediaProbe, ProbeError};
use crate::segments::{ConcatError, SegmentError};

/// Top-level error for compiling and running operations.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Filter graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Invalid segment: {0}")]
    Segment(#[from] SegmentError),

    #[error("Probe failed: {0}")]
    Probe(#[from] ProbeError),

    #[error("Invalid command: {0}")]
    Command(#[from] CommandError),

    #[error("{0}")]
    Execution(#[from] ExecutionFailure),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The per-operation log could not be created.
    #[error("Failed to open operation log: {0}")]
    Log(#[source] io::Error),

    /// The request cannot be compiled as given.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl EditorError {
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }
}

impl From<ConcatError> for EditorError {
    fn from(err: ConcatError) -> Self {
        match err {
            ConcatError::Segment(e) => Self::Segment(e),
            ConcatError::Graph(e) => Self::Graph(e),
        }
    }
}

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Compiles operations and runs them through ffmpeg.
pub struct MediaEditor {
    settings: Settings,
    probe: Box<dyn MediaProbe + Send + Sync>,
    executor: CommandExecutor,
    callback: Option<Arc<dyn Fn(&str) + Send + Sync>>,
}

impl MediaEditor {
    /// Editor probing with the configured ffprobe.
    pub fn new(settings: Settings) -> Self {
        let probe = FfprobeClient::new(settings.tools.ffprobe.clone());
        Self::with_probe(settings, probe)
    }

    /// Editor with a custom probe.
    pub fn with_probe(settings: Settings, probe: impl MediaProbe + Send + Sync + 'static) -> Self {
        Self {
            settings,
            probe: Box::new(probe),
            executor: CommandExecutor::new(),
            callback: None,
        }
    }

    /// Forward every operation log line to `callback`.
    pub fn with_log_callback(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.callback = Some(Arc::new(callback));
        self
    }

    /// Replace the executor (e.g. with a faster poll interval).
    pub fn with_executor(mut self, executor: CommandExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Whether both configured tools answer `-version`.
    pub fn tools_available(&self) -> bool {
        is_available(&self.settings.tools.ffmpeg) && is_available(&self.settings.tools.ffprobe)
    }

    /// Default output location for a file name: `<output_folder>/<name>`.
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        PathBuf::from(&self.settings.paths.output_folder).join(file_name)
    }

    /// Compile without running.
    pub fn compile(
        &self,
        operation: &Operation,
        output: impl Into<MediaAsset>,
    ) -> EditorResult<Command> {
        operation.compile(self.probe.as_ref(), &self.settings, &output.into())
    }

    /// Compile and run `operation`.
    ///
    /// Compile errors are returned as `Err`; a command that ran (or failed to
    /// start) always yields an [`ExecutionResult`], success or not.
    pub fn run(
        &self,
        operation: &Operation,
        output: impl Into<MediaAsset>,
    ) -> EditorResult<ExecutionResult> {
        let output = output.into();
        let logger = self.logger(operation.name())?;

        logger.phase(operation.name());
        logger.info(&format!("Output: {}", output));

        let command = match operation.compile(self.probe.as_ref(), &self.settings, &output) {
            Ok(command) => command,
            Err(err) => {
                logger.error(&err.to_string());
                return Err(err);
            }
        };
        logger.command(&command);

        logger.section(&format!("Executing {}", command.executable()));
        let result = self.executor.run(&command, self.settings.execution.timeout());
        for line in result.stdout_text().lines() {
            logger.output_line(line, false);
        }
        for line in result.stderr_text().lines() {
            logger.output_line(line, true);
        }

        if result.succeeded {
            logger.success(&format!(
                "{} finished in {:.1}s",
                operation.name(),
                result.elapsed.as_secs_f64()
            ));
        } else {
            let kind = result
                .failure_kind
                .map(|k| k.to_string())
                .unwrap_or_else(|| "failure".to_string());
            logger.error(&format!(
                "{} failed ({}): {}",
                operation.name(),
                kind,
                result.failure_detail.as_deref().unwrap_or("")
            ));
            logger.show_tail(command.executable());
            tracing::warn!("{} failed: {}", operation.name(), kind);
        }
        logger.close();

        Ok(result)
    }

    /// Like [`run`](Self::run), but a failed execution is an error.
    pub fn run_checked(
        &self,
        operation: &Operation,
        output: impl Into<MediaAsset>,
    ) -> EditorResult<ExecutionResult> {
        Ok(self.run(operation, output)?.into_result()?)
    }

    fn logger(&self, name: &str) -> EditorResult<OperationLogger> {
        let config = LogConfig::from(&self.settings.logging);
        let callback: Option<LogCallback> = self.callback.clone().map(|cb| {
            let forward: LogCallback = Box::new(move |line: &str| cb(line));
            forward
        });

        if self.settings.logging.write_files {
            OperationLogger::new(name, &self.settings.paths.logs_folder, config, callback)
                .map_err(EditorError::Log)
        } else {
            Ok(OperationLogger::without_file(name, config, callback))
        }
    }
}
