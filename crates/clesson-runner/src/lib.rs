//! clesson Runner
//!
//! Compiles and runs learner submissions as plain child processes.
//!
//! This crate owns everything that touches the host process table: the
//! disposable [`ScratchArea`] each grading call works in, the [`Toolchain`]
//! that turns a source file into an executable, and [`run_with_input`], which
//! executes a program with a wall-clock timeout and an output cap.
//!
//! Nothing here knows about lessons or learners; the server crate maps
//! lesson test cases onto these primitives.

pub mod execute;
pub mod scratch;
pub mod toolchain;

use std::path::PathBuf;

use thiserror::Error;

pub use execute::{run_with_input, ExecutionOutput, Limits, Termination};
pub use scratch::ScratchArea;
pub use toolchain::{CompileOutcome, Toolchain};

/// A specialized `Result` type for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Errors that prevent a compile or run from happening at all.
///
/// A program that fails to compile, crashes, or times out is *not* an error:
/// those are reported through [`CompileOutcome`] and [`Termination`].
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The scratch directory could not be created.
    #[error("failed to create scratch area: {0}\n\nSuggestion: Check that the temp directory is writable and not full")]
    ScratchCreate(#[source] std::io::Error),

    /// A file inside the scratch area could not be written.
    #[error("failed to write '{path}': {source}")]
    WriteFailed {
        /// Path of the file being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The compiler binary could not be found or started.
    #[error("compiler '{compiler}' could not be started: {source}\n\nSuggestion: Install {compiler} or set \"compiler\" in clesson.json")]
    ToolchainUnavailable {
        /// Name or path of the compiler.
        compiler: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A child process could not be spawned.
    #[error("failed to spawn '{program}': {source}")]
    SpawnFailed {
        /// Program that failed to start.
        program: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// I/O failed while supervising a running child.
    #[error("I/O error while running '{program}': {source}")]
    Io {
        /// Program being supervised.
        program: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl RunnerError {
    /// Creates a new `WriteFailed` error.
    #[must_use]
    pub fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFailed {
            path: path.into(),
            source,
        }
    }

    /// Creates a new `ToolchainUnavailable` error.
    #[must_use]
    pub fn toolchain_unavailable(compiler: impl Into<String>, source: std::io::Error) -> Self {
        Self::ToolchainUnavailable {
            compiler: compiler.into(),
            source,
        }
    }

    /// Creates a new `SpawnFailed` error.
    #[must_use]
    pub fn spawn_failed(program: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SpawnFailed {
            program: program.into(),
            source,
        }
    }

    /// Creates a new `Io` error.
    #[must_use]
    pub fn io(program: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            program: program.into(),
            source,
        }
    }
}
