//! Compiler invocation.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::execute::{run_with_input, Limits, Termination};
use crate::scratch::ScratchArea;
use crate::{Result, RunnerError};

/// Default compiler binary.
pub const DEFAULT_COMPILER: &str = "gcc";

/// Default flags: every warning is an error.
pub const DEFAULT_FLAGS: [&str; 2] = ["-Wall", "-Werror"];

/// Default wall-clock limit for a compile.
pub const DEFAULT_COMPILE_TIMEOUT: Duration = Duration::from_secs(30);

/// Diagnostics beyond this size are cut off.
const MAX_DIAGNOSTIC_BYTES: usize = 256 * 1024;

/// Result of compiling a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// The compiler produced an executable.
    Success {
        /// Path to the executable inside the scratch area.
        executable: PathBuf,
    },
    /// The compiler rejected the source.
    Failure {
        /// Raw compiler output.
        diagnostics: String,
    },
}

/// A C compiler and the flags it is invoked with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    compiler: String,
    flags: Vec<String>,
    timeout: Duration,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::new(
            DEFAULT_COMPILER,
            DEFAULT_FLAGS.iter().map(ToString::to_string),
        )
    }
}

impl Toolchain {
    /// Creates a toolchain for `compiler` with the given flags.
    #[must_use]
    pub fn new(compiler: impl Into<String>, flags: impl IntoIterator<Item = String>) -> Self {
        Self {
            compiler: compiler.into(),
            flags: flags.into_iter().collect(),
            timeout: DEFAULT_COMPILE_TIMEOUT,
        }
    }

    /// Sets the compile timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the compiler name or path.
    #[must_use]
    pub fn compiler(&self) -> &str {
        &self.compiler
    }

    /// Returns the compiler flags.
    #[must_use]
    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    /// Writes `source` to `source_file` in `scratch` and compiles it.
    ///
    /// The executable is placed next to the source, named after its stem.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::WriteFailed`] if the source cannot be written and
    /// [`RunnerError::ToolchainUnavailable`] if the compiler cannot be started.
    /// A rejected source is a [`CompileOutcome::Failure`], not an error.
    #[instrument(skip(self, scratch, source), fields(compiler = %self.compiler))]
    pub async fn compile(
        &self,
        scratch: &ScratchArea,
        source_file: &str,
        source: &str,
    ) -> Result<CompileOutcome> {
        let source_path = scratch.write_file(source_file, source).await?;
        let executable = scratch.join(&executable_name(source_file));

        let mut args: Vec<OsString> = vec![
            "-o".into(),
            executable.clone().into_os_string(),
            source_path.into_os_string(),
        ];
        args.extend(self.flags.iter().map(OsString::from));

        let limits = Limits {
            timeout: self.timeout,
            max_output_bytes: MAX_DIAGNOSTIC_BYTES,
        };
        let output = run_with_input(
            Path::new(&self.compiler),
            args,
            Some(scratch.path()),
            "",
            &limits,
        )
        .await
        .map_err(|e| match e {
            RunnerError::SpawnFailed { source, .. } => {
                RunnerError::toolchain_unavailable(&self.compiler, source)
            }
            other => other,
        })?;

        if output.succeeded() {
            info!(executable = %executable.display(), "Compilation succeeded");
            return Ok(CompileOutcome::Success { executable });
        }

        let diagnostics = match output.termination {
            Termination::TimedOut => format!(
                "compilation timed out after {}s\n{}",
                self.timeout.as_secs(),
                output.output
            ),
            Termination::Exited { .. } | Termination::OutputLimitExceeded => output.output,
        };
        debug!(len = diagnostics.len(), "Compilation failed");
        Ok(CompileOutcome::Failure { diagnostics })
    }
}

/// Derives the executable file name from a source file name.
fn executable_name(source_file: &str) -> String {
    Path::new(source_file)
        .file_stem()
        .map_or_else(|| "a.out".to_string(), |s| s.to_string_lossy().into_owned())
}
