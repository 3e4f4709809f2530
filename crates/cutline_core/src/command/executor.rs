//! Subprocess execution with capture, timeout and failure classification.
//!
//! The argument vector goes straight to the OS; nothing is interpreted by a
//! shell. stdout and stderr are drained by two reader threads so a chatty
//! tool cannot block on a full pipe while we poll for exit. The readers send
//! chunks over a channel; after a timeout kill they are only waited on for
//! [`KILL_GRACE`], since a grandchild may still hold the pipes open.

use std::io::{ErrorKind, Read};
use std::process::{Child, Command as ProcessCommand, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use super::types::{Command, ExecutionResult, FailureKind};

/// Default interval between exit checks.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How long output is still collected after a timed-out process is killed.
pub const KILL_GRACE: Duration = Duration::from_millis(250);

/// Runs built commands. Holds no per-run state and can be shared.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    poll_interval: Duration,
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override how often a running process is checked for exit.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run `command` to completion or until `timeout` expires.
    ///
    /// Never returns an error: every failure is classified in the result.
    pub fn run(&self, command: &Command, timeout: Option<Duration>) -> ExecutionResult {
        let started = Instant::now();
        tracing::debug!("Executing: {}", command);

        if let Some(parent) = command.output_path().parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    tracing::warn!("Cannot create output directory {}: {}", parent.display(), e);
                    return ExecutionResult::failed(
                        command.clone(),
                        FailureKind::Unknown,
                        format!("creating output directory {}: {}", parent.display(), e),
                        started.elapsed(),
                    );
                }
            }
        }

        let mut child = match ProcessCommand::new(command.executable())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                let kind = if e.kind() == ErrorKind::NotFound {
                    FailureKind::NotFound
                } else {
                    FailureKind::Unknown
                };
                tracing::warn!("Failed to launch {}: {}", command.executable(), e);
                return ExecutionResult::failed(
                    command.clone(),
                    kind,
                    format!("launching {}: {}", command.executable(), e),
                    started.elapsed(),
                );
            }
        };

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let waited = self.wait(&mut child, started, timeout);

        let deadline = match waited {
            Ok(None) => Some(Instant::now() + KILL_GRACE),
            _ => None,
        };
        let stdout = collect(stdout, deadline);
        let stderr = collect(stderr, deadline);
        let elapsed = started.elapsed();

        let (succeeded, exit_code, failure_kind, failure_detail) = match waited {
            Ok(Some(status)) if status.success() => (true, status.code(), None, None),
            Ok(Some(status)) => (false, status.code(), Some(FailureKind::NonZeroExit), None),
            Ok(None) => (
                false,
                None,
                Some(FailureKind::Timeout),
                Some(format!("killed after {:?}", elapsed)),
            ),
            Err(e) => (
                false,
                None,
                Some(FailureKind::Unknown),
                Some(format!("waiting for {}: {}", command.executable(), e)),
            ),
        };

        match failure_kind {
            None => tracing::debug!("{} finished in {:?}", command.executable(), elapsed),
            Some(kind) => tracing::warn!(
                "{} failed ({}), exit code {:?}",
                command.executable(),
                kind,
                exit_code
            ),
        }

        ExecutionResult {
            succeeded,
            exit_code,
            stdout,
            stderr,
            failure_kind,
            failure_detail,
            command: command.clone(),
            elapsed,
        }
    }

    /// Wait for exit. `Ok(None)` means the deadline passed and the child
    /// was killed.
    fn wait(
        &self,
        child: &mut Child,
        started: Instant,
        timeout: Option<Duration>,
    ) -> std::io::Result<Option<ExitStatus>> {
        let Some(timeout) = timeout else {
            return child.wait().map(Some);
        };

        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(Some(status));
            }
            if started.elapsed() >= timeout {
                // The process may exit between try_wait and kill
                if let Err(e) = child.kill() {
                    if e.kind() != ErrorKind::InvalidInput {
                        return Err(e);
                    }
                }
                child.wait()?;
                return Ok(None);
            }
            thread::sleep(self.poll_interval);
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<Vec<u8>>> {
    pipe.map(|mut pipe| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(chunk[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    // A read error leaves whatever was captured so far
                    Err(_) => break,
                }
            }
        });
        rx
    })
}

/// Gather everything a reader sends until it hangs up or `deadline` passes.
fn collect(reader: Option<Receiver<Vec<u8>>>, deadline: Option<Instant>) -> Vec<u8> {
    let mut buf = Vec::new();
    let Some(reader) = reader else {
        return buf;
    };

    match deadline {
        None => {
            for chunk in reader {
                buf.extend_from_slice(&chunk);
            }
        }
        Some(deadline) => loop {
            let left = deadline.saturating_duration_since(Instant::now());
            match reader.recv_timeout(left) {
                Ok(chunk) => buf.extend_from_slice(&chunk),
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    tracing::debug!("Output still open after kill; keeping {} bytes", buf.len());
                    break;
                }
            }
        },
    }
    buf
}

/// Whether `executable` can be launched (`<tool> -version` exits 0).
pub fn is_available(executable: &str) -> bool {
    ProcessCommand::new(executable)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn cmd(exe: &str, args: &[&str], output: &std::path::Path) -> Command {
        Command::new(exe, args.iter().map(|s| s.to_string()).collect(), output)
    }

    #[test]
    fn missing_executable_is_not_found() {
        let dir = tempdir().unwrap();
        let command = cmd("cutline-no-such-tool-xyz", &[], &dir.path().join("out.mp4"));
        let result = CommandExecutor::new().run(&command, None);
        assert!(!result.succeeded);
        assert_eq!(result.failure_kind, Some(FailureKind::NotFound));
        assert_eq!(result.exit_code, None);
        assert_eq!(result.command, command);
    }

    #[cfg(unix)]
    #[test]
    fn success_captures_output() {
        let dir = tempdir().unwrap();
        let command = cmd(
            "sh",
            &["-c", "echo hello; echo warn >&2"],
            &dir.path().join("out.txt"),
        );
        let result = CommandExecutor::new().run(&command, Some(Duration::from_secs(10)));
        assert!(result.succeeded);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.stdout, b"hello\n");
        assert_eq!(result.stderr_text(), "warn\n");
        assert!(result.failure_kind.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_keeps_stderr() {
        let dir = tempdir().unwrap();
        let command = cmd(
            "sh",
            &["-c", "echo 'Invalid argument' >&2; exit 3"],
            &dir.path().join("out.txt"),
        );
        let result = CommandExecutor::new().run(&command, None);
        assert!(!result.succeeded);
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.failure_kind, Some(FailureKind::NonZeroExit));
        assert!(result.stderr_text().contains("Invalid argument"));

        let err = result.into_result().unwrap_err();
        assert!(err.to_string().contains("Invalid argument"));
    }

    #[cfg(unix)]
    #[test]
    fn timeout_kills_the_process() {
        let dir = tempdir().unwrap();
        let command = cmd("sleep", &["5"], &dir.path().join("out.txt"));
        let result = CommandExecutor::new()
            .with_poll_interval(Duration::from_millis(5))
            .run(&command, Some(Duration::from_millis(100)));
        assert!(!result.succeeded);
        assert_eq!(result.failure_kind, Some(FailureKind::Timeout));
        assert!(result.elapsed < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn timeout_does_not_wait_for_grandchildren() {
        let dir = tempdir().unwrap();
        // The shell forks `sleep`, which keeps the pipes open after the
        // shell itself is killed.
        let command = cmd(
            "sh",
            &["-c", "sleep 3; echo done"],
            &dir.path().join("out.txt"),
        );
        let started = Instant::now();
        let result = CommandExecutor::new()
            .with_poll_interval(Duration::from_millis(5))
            .run(&command, Some(Duration::from_millis(200)));

        assert_eq!(result.failure_kind, Some(FailureKind::Timeout));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[test]
    fn binary_stdout_is_captured_raw() {
        let dir = tempdir().unwrap();
        let command = cmd("printf", &["\\377\\376"], &dir.path().join("out.bin"));
        let result = CommandExecutor::new().run(&command, None);
        assert!(result.succeeded);
        assert_eq!(result.stdout, [0xff, 0xfe]);
    }

    #[cfg(unix)]
    #[test]
    fn creates_output_directory() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("nested").join("deeper").join("out.mp4");
        let command = cmd("true", &[], &output);
        let result = CommandExecutor::new().run(&command, None);
        assert!(result.succeeded);
        assert!(output.parent().unwrap().is_dir());
    }

    #[test]
    fn unwritable_output_directory_is_unknown() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let command = cmd("true", &[], &blocker.join("out.mp4"));
        let result = CommandExecutor::new().run(&command, None);
        assert!(!result.succeeded);
        assert_eq!(result.failure_kind, Some(FailureKind::Unknown));
        assert!(result.failure_detail.unwrap().contains("output directory"));
    }

    #[test]
    fn missing_tool_is_unavailable() {
        assert!(!is_available("cutline-no-such-tool-xyz"));
    }
}
