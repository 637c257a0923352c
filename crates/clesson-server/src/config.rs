//! Configuration for the clesson server.
//!
//! Settings are read from `clesson.json`. Every field is optional; a missing
//! file yields the defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clesson_runner::{Limits, Toolchain};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};

/// The default config file name.
pub const CONFIG_FILE_NAME: &str = "clesson.json";

/// Default port the server listens on.
pub const DEFAULT_PORT: u16 = 50052;

fn default_lessons_dir() -> PathBuf {
    PathBuf::from("lessons")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_compiler() -> String {
    clesson_runner::toolchain::DEFAULT_COMPILER.to_string()
}

fn default_compiler_flags() -> Vec<String> {
    clesson_runner::toolchain::DEFAULT_FLAGS
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_source_file_name() -> String {
    "solution.c".to_string()
}

const fn default_compile_timeout_secs() -> u64 {
    30
}

const fn default_run_timeout_secs() -> u64 {
    5
}

const fn default_max_output_bytes() -> usize {
    64 * 1024
}

const fn default_max_concurrent_grades() -> usize {
    4
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Root of the lesson content tree.
    #[serde(default = "default_lessons_dir")]
    pub lessons_dir: PathBuf,

    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// C compiler used for grading.
    #[serde(default = "default_compiler")]
    pub compiler: String,

    /// Flags passed to the compiler after the source path.
    #[serde(default = "default_compiler_flags")]
    pub compiler_flags: Vec<String>,

    /// File name the submission is written to before compiling.
    #[serde(default = "default_source_file_name")]
    pub source_file_name: String,

    /// Wall-clock limit for a compile, in seconds.
    #[serde(default = "default_compile_timeout_secs")]
    pub compile_timeout_secs: u64,

    /// Wall-clock limit for one test case run, in seconds.
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,

    /// Cap on captured output per test case.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,

    /// Maximum number of submissions graded at once.
    #[serde(default = "default_max_concurrent_grades")]
    pub max_concurrent_grades: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lessons_dir: default_lessons_dir(),
            host: default_host(),
            port: default_port(),
            compiler: default_compiler(),
            compiler_flags: default_compiler_flags(),
            source_file_name: default_source_file_name(),
            compile_timeout_secs: default_compile_timeout_secs(),
            run_timeout_secs: default_run_timeout_secs(),
            max_output_bytes: default_max_output_bytes(),
            max_concurrent_grades: default_max_concurrent_grades(),
        }
    }
}

impl Config {
    /// Loads `clesson.json` from the current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is invalid.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            ServerError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads `clesson.json` from `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is invalid.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::ConfigParseError` if the file cannot be read or
    /// is not valid JSON, and `ServerError::ConfigValidationError` if a value
    /// is out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(ServerError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ServerError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::ConfigValidationError` on the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(ServerError::config_validation(
                "port must be greater than 0",
                "Set port in your clesson.json (default 50052)",
            ));
        }

        if self.host.trim().is_empty() {
            return Err(ServerError::config_validation(
                "host must not be empty",
                "Set host to an address such as 127.0.0.1",
            ));
        }

        if self.compiler.trim().is_empty() {
            return Err(ServerError::config_validation(
                "compiler must not be empty",
                "Set compiler to a C compiler on PATH, e.g. gcc",
            ));
        }

        if self.source_file_name.trim().is_empty()
            || self.source_file_name.contains(['/', '\\'])
        {
            return Err(ServerError::config_validation(
                format!("sourceFileName '{}' is not a plain file name", self.source_file_name),
                "Use a bare file name such as solution.c",
            ));
        }

        if self.compile_timeout_secs == 0 || self.run_timeout_secs == 0 {
            return Err(ServerError::config_validation(
                "compileTimeoutSecs and runTimeoutSecs must be greater than 0",
                "Set both timeouts to at least 1 second",
            ));
        }

        if self.max_output_bytes == 0 {
            return Err(ServerError::config_validation(
                "maxOutputBytes must be greater than 0",
                "Set maxOutputBytes to a positive byte count",
            ));
        }

        if self.max_concurrent_grades == 0 {
            return Err(ServerError::config_validation(
                "maxConcurrentGrades must be greater than 0",
                "Set maxConcurrentGrades to at least 1",
            ));
        }

        Ok(())
    }

    /// Builds the compiler invocation from this configuration.
    #[must_use]
    pub fn toolchain(&self) -> Toolchain {
        Toolchain::new(self.compiler.clone(), self.compiler_flags.clone())
            .with_timeout(Duration::from_secs(self.compile_timeout_secs))
    }

    /// Builds the per-test execution limits.
    #[must_use]
    pub const fn run_limits(&self) -> Limits {
        Limits {
            timeout: Duration::from_secs(self.run_timeout_secs),
            max_output_bytes: self.max_output_bytes,
        }
    }

    /// Returns `host:port`.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
