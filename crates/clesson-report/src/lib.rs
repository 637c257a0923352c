//! clesson Report Rendering
//!
//! Turns lessons, grading results and learner progress into text for the
//! terminal, Markdown for lesson workspaces, or JSON for scripts.
//!
//! The input types here mirror the server's wire types without depending on
//! the server crate, so any client can render what it received.
//!
//! # Generators
//!
//! - [`ResultsGenerator`] - Pass/fail listing for a graded submission
//! - [`ProgressGenerator`] - Summary of a learner's progress
//! - [`InstructionsGenerator`] - `README.md` for a lesson workspace
//! - [`json::JsonGenerator`] - Compact or pretty JSON for any input
//!
//! # Example
//!
//! ```rust
//! use clesson_report::{ResultsGenerator, TestResultInput, ValidationInput};
//!
//! let validation = ValidationInput {
//!     is_valid: true,
//!     test_results: vec![TestResultInput::passed("Prints greeting", "Hello\n")],
//!     feedback: "Great job! All tests passed successfully.".to_string(),
//!     can_proceed: true,
//! };
//!
//! let text = ResultsGenerator::new(1, &validation).generate();
//! assert!(text.contains("✓ Prints greeting"));
//! ```

mod instructions;
pub mod json;
mod text;

pub use instructions::InstructionsGenerator;
pub use text::{ProgressGenerator, ResultsGenerator};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while rendering.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to serialize to JSON.
    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

// ============================================================================
// Lesson
// ============================================================================

/// A lesson as shown to the learner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonInput {
    /// Lesson id.
    pub id: u32,
    /// Lesson title.
    pub title: String,
    /// Lesson body text.
    pub description: String,
    /// Worked example in C.
    #[serde(default)]
    pub example_code: String,
    /// Learning objectives.
    #[serde(default)]
    pub objectives: Vec<String>,
    /// Test cases, in display order.
    #[serde(default)]
    pub test_cases: Vec<TestCaseInput>,
    /// Prerequisite lesson ids.
    #[serde(default)]
    pub prerequisites: Vec<u32>,
}

/// One test case of a lesson.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseInput {
    /// Text fed on stdin.
    #[serde(default)]
    pub input: String,
    /// Output the program must print.
    pub expected_output: String,
    /// What the case checks.
    #[serde(default)]
    pub description: String,
}

// ============================================================================
// Validation
// ============================================================================

/// Grading result for one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationInput {
    /// Whether every test passed.
    pub is_valid: bool,
    /// Per-test results; empty when compilation failed.
    pub test_results: Vec<TestResultInput>,
    /// Summary message or compiler diagnostics.
    pub feedback: String,
    /// Whether the learner may move on.
    pub can_proceed: bool,
}

impl ValidationInput {
    /// Returns `true` if the submission never reached the test stage.
    #[must_use]
    pub fn is_compile_failure(&self) -> bool {
        !self.is_valid && self.test_results.is_empty()
    }

    /// Number of passing tests.
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.test_results.iter().filter(|t| t.passed).count()
    }
}

/// Result of a single test case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResultInput {
    /// Whether the case passed.
    pub passed: bool,
    /// What the case checks.
    pub description: String,
    /// Expected output.
    pub expected_output: String,
    /// Actual output.
    pub actual_output: String,
    /// Whether the program was killed for running too long.
    #[serde(default)]
    pub timed_out: bool,
    /// Exit code, if the program exited with one.
    #[serde(default)]
    pub exit_code: Option<i32>,
}

impl TestResultInput {
    /// Creates a passing result whose output matched.
    #[must_use]
    pub fn passed(description: impl Into<String>, output: impl Into<String>) -> Self {
        let output = output.into();
        Self {
            passed: true,
            description: description.into(),
            expected_output: output.clone(),
            actual_output: output,
            timed_out: false,
            exit_code: Some(0),
        }
    }

    /// Creates a failing result.
    #[must_use]
    pub fn failed(
        description: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            passed: false,
            description: description.into(),
            expected_output: expected.into(),
            actual_output: actual.into(),
            timed_out: false,
            exit_code: Some(0),
        }
    }
}

// ============================================================================
// Progress
// ============================================================================

/// A learner's progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressInput {
    /// Learner id.
    pub user_id: String,
    /// Lesson the learner is working on.
    pub current_lesson: u32,
    /// Completed lessons, ascending.
    pub completed_lessons: Vec<u32>,
    /// Share of the catalog completed, 0 to 100.
    pub completion_percentage: f64,
    /// Lesson to attempt next.
    pub next_lesson: u32,
}
