//! Error types for the clesson server.
//!
//! This module defines the error hierarchy for configuration loading,
//! lesson catalog loading, grading, and progress gating.

use std::path::PathBuf;

use clesson_runner::RunnerError;

use crate::lesson::LessonId;

/// A specialized `Result` type for clesson server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors that can occur while serving lessons and grading submissions.
///
/// Variants that describe a learner's mistake (unknown lesson, unmet
/// prerequisites) are kept apart from system failures so callers can tell
/// "grading could not run" from "grading ran and failed".
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your clesson.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Lesson Catalog Errors
    // ========================================================================
    /// The lessons root directory does not exist.
    #[error("Lessons directory not found: '{path}'\n\nSuggestion: Check the 'lessonsDir' field in clesson.json or pass --lessons")]
    LessonsDirNotFound {
        /// Path where lessons were expected.
        path: PathBuf,
    },

    /// A lesson descriptor or one of its paired files could not be loaded.
    #[error("Failed to load lesson from '{path}': {message}")]
    LessonLoadError {
        /// File that failed to load.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// Two lessons share the same id.
    #[error("Duplicate lesson id {id}\n\nSuggestion: Give every lesson.json a unique id")]
    DuplicateLesson {
        /// The repeated id.
        id: LessonId,
    },

    /// A lesson declared id 0.
    #[error("Invalid lesson id 0 for '{title}'\n\nSuggestion: Lesson ids start at 1")]
    InvalidLessonId {
        /// Title of the offending lesson.
        title: String,
    },

    /// The requested lesson is not in the catalog.
    #[error("lesson {id} not found")]
    LessonNotFound {
        /// The requested id.
        id: LessonId,
    },

    // ========================================================================
    // Progress Errors
    // ========================================================================
    /// The learner has not completed every prerequisite of the lesson.
    #[error("lesson {lesson_id} requires completing lessons {missing:?} first")]
    PrerequisitesNotMet {
        /// The lesson being attempted.
        lesson_id: LessonId,
        /// Prerequisites not yet completed.
        missing: Vec<LessonId>,
    },

    // ========================================================================
    // Grading System Errors
    // ========================================================================
    /// The toolchain or a test process could not be run.
    #[error("grading could not run: {0}")]
    Runner(#[from] RunnerError),

    /// The grader stopped accepting work.
    #[error("grader is shutting down")]
    GraderUnavailable,

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ServerError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `LessonsDirNotFound` error.
    #[must_use]
    pub fn lessons_dir_not_found(path: impl Into<PathBuf>) -> Self {
        Self::LessonsDirNotFound { path: path.into() }
    }

    /// Creates a new `LessonLoadError`.
    #[must_use]
    pub fn lesson_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::LessonLoadError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `LessonNotFound` error.
    #[must_use]
    pub const fn lesson_not_found(id: LessonId) -> Self {
        Self::LessonNotFound { id }
    }

    /// Creates a new `PrerequisitesNotMet` error.
    #[must_use]
    pub fn prerequisites_not_met(lesson_id: LessonId, missing: Vec<LessonId>) -> Self {
        Self::PrerequisitesNotMet { lesson_id, missing }
    }

    /// Returns `true` if this error means grading could not run at all.
    #[must_use]
    pub const fn is_system_failure(&self) -> bool {
        matches!(
            self,
            Self::Runner(_) | Self::GraderUnavailable | Self::Io(_) | Self::Json(_)
        )
    }

    /// Returns `true` if this error aborts server startup.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigParseError { .. }
                | Self::ConfigValidationError { .. }
                | Self::LessonsDirNotFound { .. }
                | Self::LessonLoadError { .. }
                | Self::DuplicateLesson { .. }
                | Self::InvalidLessonId { .. }
        )
    }
}
