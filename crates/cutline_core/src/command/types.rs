//! Command and execution result types.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// A fully built invocation of an external tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    executable: String,
    args: Vec<String>,
    output_path: PathBuf,
}

impl Command {
    /// Create a command. `output_path` is the file the tool writes; its
    /// parent directory is created before the tool is launched.
    pub fn new(
        executable: impl Into<String>,
        args: Vec<String>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            executable: executable.into(),
            args,
            output_path: output_path.into(),
        }
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Argument vector, without the executable.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Value following the first occurrence of `flag`.
    pub fn arg_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// All values following occurrences of `flag`, in order.
    pub fn arg_values<'a>(&'a self, flag: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.args
            .windows(2)
            .filter(move |w| w[0] == flag)
            .map(|w| w[1].as_str())
    }

    /// Single-line form for logs, with arguments quoted where needed.
    pub fn to_command_line(&self) -> String {
        std::iter::once(self.executable.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote_for_display)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// One option per line, for readable logs.
    pub fn to_pretty(&self) -> String {
        let mut tokens = Vec::with_capacity(self.args.len() + 1);
        tokens.push(self.executable.clone());
        tokens.extend(self.args.iter().cloned());
        format_tokens_pretty(&tokens)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_command_line())
    }
}

/// Quote a token for display only. Execution never goes through a shell.
fn quote_for_display(token: &str) -> String {
    let plain = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,@%".contains(c));
    if plain {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', "'\\''"))
    }
}

/// Format command tokens one option per line.
///
/// An option and its value share a line; every line but the last ends in a
/// shell continuation.
pub fn format_tokens_pretty(tokens: &[String]) -> String {
    let mut lines = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];

        if i > 0 && token.starts_with('-') && i + 1 < tokens.len() && !tokens[i + 1].starts_with('-') {
            // Option with value
            lines.push(format!("  {} {}", token, quote_for_display(&tokens[i + 1])));
            i += 2;
        } else if i == 0 {
            lines.push(quote_for_display(token));
            i += 1;
        } else {
            lines.push(format!("  {}", quote_for_display(token)));
            i += 1;
        }
    }

    lines.join(" \\\n")
}

/// Why a command could not be built.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Command has no inputs")]
    NoInputs,

    /// A pad or map names an input index with no matching `-i`.
    #[error("Input {index} is referenced but only {available} input(s) were added")]
    MissingInput { index: usize, available: usize },

    /// A label map without a filter graph.
    #[error("Map [{0}] needs a filter graph but none was set")]
    NoFilterGraph(String),

    /// A label map that is not an output of the filter graph.
    #[error("Map [{0}] is not an output of the filter graph")]
    UnknownMap(String),

    /// A graph output that nothing maps into the file.
    #[error("Filter graph output [{0}] is never mapped")]
    UnmappedOutput(String),

    #[error("Output path is also an input: {0}")]
    OutputIsInput(String),
}

/// Classification of a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The executable could not be found.
    NotFound,
    /// The tool ran and exited with a non-zero status.
    NonZeroExit,
    /// The tool exceeded its time limit and was killed.
    Timeout,
    /// Anything else: launch, wait or output directory failures.
    Unknown,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::NotFound => "not found",
            FailureKind::NonZeroExit => "non-zero exit",
            FailureKind::Timeout => "timeout",
            FailureKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Everything known about one run, successful or not.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub succeeded: bool,
    /// Exit status; `None` when the process never ran or was killed.
    pub exit_code: Option<i32>,
    /// Raw bytes written to stdout; may be binary (`pipe:1` outputs).
    pub stdout: Vec<u8>,
    /// Raw bytes written to stderr.
    pub stderr: Vec<u8>,
    pub failure_kind: Option<FailureKind>,
    /// Launch or wait error message when no exit status explains the failure.
    pub failure_detail: Option<String>,
    /// The command that was attempted.
    pub command: Command,
    pub elapsed: Duration,
}

impl ExecutionResult {
    pub(crate) fn failed(
        command: Command,
        kind: FailureKind,
        detail: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            succeeded: false,
            exit_code: None,
            stdout: Vec::new(),
            stderr: Vec::new(),
            failure_kind: Some(kind),
            failure_detail: Some(detail.into()),
            command,
            elapsed,
        }
    }

    /// stdout as text, invalid UTF-8 replaced.
    pub fn stdout_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    /// stderr as text, invalid UTF-8 replaced.
    pub fn stderr_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    /// Last `lines` lines of stderr.
    pub fn stderr_tail(&self, lines: usize) -> String {
        let text = self.stderr_text();
        let all: Vec<&str> = text.lines().collect();
        let start = all.len().saturating_sub(lines);
        all[start..].join("\n")
    }

    /// Convert into a `Result`, turning failures into [`ExecutionFailure`].
    pub fn into_result(self) -> Result<ExecutionResult, ExecutionFailure> {
        let Some(kind) = self.failure_kind else {
            return Ok(self);
        };
        let command = self.command.to_pretty();
        let detail = self.failure_detail.clone().unwrap_or_default();
        let stderr = self.stderr_text().into_owned();

        Err(match kind {
            FailureKind::NotFound => ExecutionFailure::NotFound {
                executable: self.command.executable().to_string(),
            },
            FailureKind::NonZeroExit => ExecutionFailure::NonZeroExit {
                exit_code: self.exit_code.unwrap_or(-1),
                command,
                stderr,
            },
            FailureKind::Timeout => ExecutionFailure::Timeout {
                elapsed: self.elapsed,
                command,
                stderr,
            },
            FailureKind::Unknown => ExecutionFailure::Unknown {
                message: detail,
                command,
            },
        })
    }
}

/// A failed run as an error value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionFailure {
    #[error("Executable not found: {executable}")]
    NotFound { executable: String },

    #[error("Command exited with code {exit_code}:\n{command}\n{stderr}")]
    NonZeroExit {
        exit_code: i32,
        command: String,
        stderr: String,
    },

    #[error("Command timed out after {elapsed:?} and was killed:\n{command}")]
    Timeout {
        elapsed: Duration,
        command: String,
        stderr: String,
    },

    #[error("Command failed: {message}\n{command}")]
    Unknown { message: String, command: String },
}

impl ExecutionFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            ExecutionFailure::NotFound { .. } => FailureKind::NotFound,
            ExecutionFailure::NonZeroExit { .. } => FailureKind::NonZeroExit,
            ExecutionFailure::Timeout { .. } => FailureKind::Timeout,
            ExecutionFailure::Unknown { .. } => FailureKind::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Command {
        Command::new(
            "ffmpeg",
            vec![
                "-hide_banner".to_string(),
                "-y".to_string(),
                "-i".to_string(),
                "in put.mp4".to_string(),
                "-map".to_string(),
                "[a1]".to_string(),
                "out.mp4".to_string(),
            ],
            "out.mp4",
        )
    }

    #[test]
    fn command_line_quotes_special_tokens() {
        assert_eq!(
            sample().to_command_line(),
            "ffmpeg -hide_banner -y -i 'in put.mp4' -map '[a1]' out.mp4"
        );
    }

    #[test]
    fn pretty_pairs_options_with_values() {
        let pretty = sample().to_pretty();
        let lines: Vec<&str> = pretty.lines().collect();
        assert_eq!(lines[0], "ffmpeg \\");
        assert_eq!(lines[1], "  -hide_banner \\");
        assert_eq!(lines[3], "  -i 'in put.mp4' \\");
        assert_eq!(lines.last(), Some(&"  out.mp4"));
    }

    #[test]
    fn arg_lookup() {
        let cmd = sample();
        assert_eq!(cmd.arg_value("-i"), Some("in put.mp4"));
        assert_eq!(cmd.arg_values("-map").collect::<Vec<_>>(), vec!["[a1]"]);
        assert_eq!(cmd.arg_value("-c:v"), None);
    }

    #[test]
    fn failure_converts_to_error() {
        let mut result = ExecutionResult::failed(
            sample(),
            FailureKind::NonZeroExit,
            "",
            Duration::from_millis(5),
        );
        result.exit_code = Some(1);
        result.stderr = b"line1\nline2\nInvalid argument".to_vec();
        assert_eq!(result.stderr_tail(1), "Invalid argument");

        let err = result.into_result().unwrap_err();
        assert_eq!(err.kind(), FailureKind::NonZeroExit);
        let msg = err.to_string();
        assert!(msg.contains("code 1"));
        assert!(msg.contains("Invalid argument"));
        assert!(msg.contains("ffmpeg"));
    }

    #[test]
    fn binary_output_is_kept_verbatim() {
        let mut result = ExecutionResult::failed(
            sample(),
            FailureKind::Unknown,
            "",
            Duration::ZERO,
        );
        result.stdout = vec![0xff, 0xfe];
        result.stderr = b"ok\n\xff".to_vec();
        assert_eq!(result.stdout, [0xff, 0xfe]);
        assert_eq!(result.stderr_text(), "ok\n\u{fffd}");
        assert_eq!(result.stderr_tail(1), "\u{fffd}");
    }

    #[test]
    fn command_error_messages() {
        let err = CommandError::MissingInput {
            index: 2,
            available: 1,
        };
        assert!(err.to_string().contains("Input 2"));
    }
}
