//! Bounded child-process execution.
//!
//! [`run_with_input`] spawns a program, writes a string to its stdin, and
//! collects stdout followed by stderr. The child is killed when it exceeds
//! its wall-clock limit; output beyond the cap is drained and discarded so
//! a chatty program can never block on a full pipe.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use crate::{Result, RunnerError};

/// Default wall-clock limit for a single execution.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default cap on captured output (stdout and stderr combined).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 64 * 1024;

/// How long to wait for output readers once the child is gone.
///
/// A program that forked a grandchild can keep the pipes open after the
/// direct child is killed.
const READER_GRACE: Duration = Duration::from_millis(500);

/// Resource limits applied to one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Wall-clock time before the child is killed.
    pub timeout: Duration,
    /// Maximum number of output bytes retained.
    pub max_output_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl Limits {
    /// Creates limits with the given timeout and the default output cap.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The process exited on its own. `code` is `None` when it was killed by a signal.
    Exited {
        /// Exit code, if any.
        code: Option<i32>,
    },
    /// The process exceeded its wall-clock limit and was killed.
    TimedOut,
    /// The process exited but produced more output than the cap allows.
    OutputLimitExceeded,
}

/// Captured result of one execution.
#[derive(Debug, Clone)]
pub struct ExecutionOutput {
    /// Stdout followed by stderr, lossily decoded as UTF-8.
    pub output: String,
    /// How the process ended.
    pub termination: Termination,
    /// Wall-clock time from spawn to exit or kill.
    pub elapsed: Duration,
}

impl ExecutionOutput {
    /// Returns `true` if the process exited with status 0 within its limits.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.termination, Termination::Exited { code: Some(0) })
    }

    /// Returns the exit code, if the process exited with one.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        match self.termination {
            Termination::Exited { code } => code,
            Termination::TimedOut | Termination::OutputLimitExceeded => None,
        }
    }

    /// Returns `true` if the process was killed for exceeding its timeout.
    #[must_use]
    pub const fn timed_out(&self) -> bool {
        matches!(self.termination, Termination::TimedOut)
    }
}

#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    truncated: bool,
}

/// Runs `program` with `args`, feeding `input` on stdin.
///
/// A crash, non-zero exit, or timeout is reported through
/// [`ExecutionOutput::termination`], never as an error.
///
/// # Errors
///
/// Returns [`RunnerError::SpawnFailed`] if the process cannot be started and
/// [`RunnerError::Io`] if waiting on it fails.
#[instrument(skip_all, fields(program = %program.display()))]
pub async fn run_with_input<I, S>(
    program: &Path,
    args: I,
    cwd: Option<&Path>,
    input: &str,
    limits: &Limits,
) -> Result<ExecutionOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let started = Instant::now();

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let mut child = command
        .spawn()
        .map_err(|e| RunnerError::spawn_failed(program, e))?;

    let cap = limits.max_output_bytes;
    let stdin_task = tokio::spawn(feed_stdin(child.stdin.take(), input.as_bytes().to_vec()));
    let mut stdout_task = tokio::spawn(read_capped(child.stdout.take(), cap));
    let mut stderr_task = tokio::spawn(read_capped(child.stderr.take(), cap));

    let waited = timeout(limits.timeout, child.wait()).await;
    let status = if let Ok(waited) = waited {
        Some(waited.map_err(|e| RunnerError::io(program, e))?)
    } else {
        warn!(
            timeout_ms = u64::try_from(limits.timeout.as_millis()).unwrap_or(u64::MAX),
            "Execution timed out, killing child"
        );
        if let Err(e) = child.kill().await {
            debug!(error = %e, "Kill after timeout failed");
        }
        None
    };

    stdin_task.abort();
    let stdout = collect(&mut stdout_task).await;
    let stderr = collect(&mut stderr_task).await;

    let mut bytes = stdout.bytes;
    bytes.extend_from_slice(&stderr.bytes);
    let truncated = stdout.truncated || stderr.truncated || bytes.len() > cap;
    bytes.truncate(cap);

    let termination = match status {
        None => Termination::TimedOut,
        Some(_) if truncated => Termination::OutputLimitExceeded,
        Some(status) => Termination::Exited {
            code: status.code(),
        },
    };

    let elapsed = started.elapsed();
    debug!(?termination, ?elapsed, "Execution finished");

    Ok(ExecutionOutput {
        output: String::from_utf8_lossy(&bytes).into_owned(),
        termination,
        elapsed,
    })
}

async fn feed_stdin(stdin: Option<ChildStdin>, input: Vec<u8>) {
    let Some(mut stdin) = stdin else {
        return;
    };
    // Programs that never read stdin may exit and close the pipe first.
    if let Err(e) = stdin.write_all(&input).await {
        debug!(error = %e, "stdin closed before input was fully written");
    }
}

async fn read_capped<R>(reader: Option<R>, cap: usize) -> std::io::Result<Captured>
where
    R: AsyncRead + Unpin,
{
    let mut captured = Captured::default();
    let Some(mut reader) = reader else {
        return Ok(captured);
    };

    let mut chunk = [0_u8; 8192];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        let room = cap.saturating_sub(captured.bytes.len());
        let keep = n.min(room);
        captured.bytes.extend_from_slice(&chunk[..keep]);
        if keep < n {
            captured.truncated = true;
        }
    }
    Ok(captured)
}

async fn collect(task: &mut JoinHandle<std::io::Result<Captured>>) -> Captured {
    match timeout(READER_GRACE, &mut *task).await {
        Ok(Ok(Ok(captured))) => captured,
        Ok(Ok(Err(e))) => {
            debug!(error = %e, "Reading child output failed");
            Captured::default()
        }
        Ok(Err(e)) => {
            debug!(error = %e, "Output reader task failed");
            Captured::default()
        }
        Err(_) => {
            task.abort();
            debug!("Output reader still blocked after child exit, discarding");
            Captured::default()
        }
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sh() -> &'static Path {
        Path::new("sh")
    }

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let out = run_with_input(sh(), ["-c", "echo hello"], None, "", &Limits::default())
            .await
            .unwrap();

        assert_eq!(out.output, "hello\n");
        assert!(out.succeeded());
        assert_eq!(out.exit_code(), Some(0));
    }

    #[tokio::test]
    async fn feeds_stdin() {
        let out = run_with_input(sh(), ["-c", "cat"], None, "3 4\n", &Limits::default())
            .await
            .unwrap();

        assert_eq!(out.output, "3 4\n");
    }

    #[tokio::test]
    async fn stderr_follows_stdout() {
        let out = run_with_input(
            sh(),
            ["-c", "echo out; echo err 1>&2"],
            None,
            "",
            &Limits::default(),
        )
        .await
        .unwrap();

        assert_eq!(out.output, "out\nerr\n");
    }

    #[tokio::test]
    async fn nonzero_exit_is_not_an_error() {
        let out = run_with_input(sh(), ["-c", "exit 3"], None, "", &Limits::default())
            .await
            .unwrap();

        assert!(!out.succeeded());
        assert_eq!(out.termination, Termination::Exited { code: Some(3) });
    }

    #[tokio::test]
    async fn timeout_kills_child() {
        let limits = Limits::with_timeout(Duration::from_millis(200));
        let out = run_with_input(sh(), ["-c", "exec sleep 10"], None, "", &limits)
            .await
            .unwrap();

        assert!(out.timed_out());
        assert!(!out.succeeded());
        assert!(out.elapsed < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn output_is_capped() {
        let limits = Limits {
            timeout: Duration::from_secs(5),
            max_output_bytes: 1024,
        };
        let out = run_with_input(
            sh(),
            ["-c", "head -c 200000 /dev/zero | tr '\\0' 'x'"],
            None,
            "",
            &limits,
        )
        .await
        .unwrap();

        assert_eq!(out.output.len(), 1024);
        assert_eq!(out.termination, Termination::OutputLimitExceeded);
        assert!(!out.succeeded());
    }

    #[tokio::test]
    async fn program_ignoring_stdin_still_completes() {
        let input = "x".repeat(1024 * 1024);
        let out = run_with_input(sh(), ["-c", "echo done"], None, &input, &Limits::default())
            .await
            .unwrap();

        assert_eq!(out.output, "done\n");
        assert!(out.succeeded());
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let result = run_with_input(
            Path::new("/nonexistent/clesson-program"),
            std::iter::empty::<&str>(),
            None,
            "",
            &Limits::default(),
        )
        .await;

        assert!(matches!(result, Err(RunnerError::SpawnFailed { .. })));
    }
}
