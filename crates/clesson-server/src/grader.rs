//! Submission grading.
//!
//! A submission is compiled once in a fresh scratch area, then the resulting
//! executable is run once per test case. Compile failures and failing test
//! cases are ordinary outcomes; only an inability to run the toolchain or the
//! program is reported as an error.

use std::sync::Arc;

use clesson_runner::{run_with_input, CompileOutcome, Limits, ScratchArea, Toolchain};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{Result, ServerError};
use crate::lesson::{LessonId, TestCase};

/// Feedback when every test passes.
pub const ALL_PASSED_FEEDBACK: &str = "Great job! All tests passed successfully.";

/// Feedback when no test passes.
pub const NONE_PASSED_FEEDBACK: &str = "None of the tests passed. Review your code and try again.";

/// Result of one test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestVerdict {
    /// Description copied from the test case.
    pub description: String,
    /// Whether the program exited cleanly with the expected output.
    pub passed: bool,
    /// Output the test case expects.
    pub expected_output: String,
    /// Output the program actually produced.
    pub actual_output: String,
    /// Whether the program was killed for running too long.
    pub timed_out: bool,
    /// Exit code, if the program exited with one.
    pub exit_code: Option<i32>,
}

/// Aggregate result of grading one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// `true` if the submission compiled and every verdict passed.
    pub all_tests_passed: bool,
    /// Per-test verdicts; empty when compilation failed.
    pub verdicts: Vec<TestVerdict>,
    /// Human-readable summary or compiler diagnostics.
    pub feedback: String,
    /// Whether the learner may move on.
    pub can_proceed: bool,
}

impl ValidationOutcome {
    fn compile_failure(diagnostics: String) -> Self {
        Self {
            all_tests_passed: false,
            verdicts: Vec::new(),
            feedback: diagnostics,
            can_proceed: false,
        }
    }

    fn from_verdicts(verdicts: Vec<TestVerdict>) -> Self {
        let all_tests_passed = verdicts.iter().all(|v| v.passed);
        Self {
            feedback: feedback(&verdicts),
            all_tests_passed,
            can_proceed: all_tests_passed,
            verdicts,
        }
    }
}

/// Builds the summary message for a set of verdicts.
#[must_use]
pub fn feedback(verdicts: &[TestVerdict]) -> String {
    let total = verdicts.len();
    let failed = verdicts.iter().filter(|v| !v.passed).count();

    if failed == 0 {
        ALL_PASSED_FEEDBACK.to_string()
    } else if failed == total {
        NONE_PASSED_FEEDBACK.to_string()
    } else {
        format!("{failed} out of {total} tests failed. Check the test results and try again.")
    }
}

/// Compares program output to the expected output, ignoring surrounding
/// whitespace.
#[must_use]
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    actual.trim() == expected.trim()
}

/// Compiles and tests submissions against the catalog.
#[derive(Debug, Clone)]
pub struct Grader {
    catalog: Arc<Catalog>,
    toolchain: Toolchain,
    source_file: String,
    limits: Limits,
    permits: Arc<Semaphore>,
}

impl Grader {
    /// Creates a grader with explicit settings.
    #[must_use]
    pub fn new(
        catalog: Arc<Catalog>,
        toolchain: Toolchain,
        source_file: impl Into<String>,
        limits: Limits,
        max_concurrent: usize,
    ) -> Self {
        Self {
            catalog,
            toolchain,
            source_file: source_file.into(),
            limits,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Creates a grader from server configuration.
    #[must_use]
    pub fn from_config(catalog: Arc<Catalog>, config: &Config) -> Self {
        Self::new(
            catalog,
            config.toolchain(),
            config.source_file_name.clone(),
            config.run_limits(),
            config.max_concurrent_grades,
        )
    }

    /// Grades `source` against the test cases of `lesson_id`.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::LessonNotFound` for an unknown lesson and
    /// `ServerError::Runner` if the scratch area, compiler or program cannot
    /// be used.
    #[instrument(skip(self, source), fields(source_len = source.len()))]
    pub async fn validate(&self, lesson_id: LessonId, source: &str) -> Result<ValidationOutcome> {
        let lesson = self.catalog.get(lesson_id)?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ServerError::GraderUnavailable)?;

        let scratch = ScratchArea::create()?;
        let executable = match self
            .toolchain
            .compile(&scratch, &self.source_file, source)
            .await?
        {
            CompileOutcome::Success { executable } => executable,
            CompileOutcome::Failure { diagnostics } => {
                info!(lesson_id, "Submission failed to compile");
                return Ok(ValidationOutcome::compile_failure(diagnostics));
            }
        };

        let mut verdicts = Vec::with_capacity(lesson.test_cases.len());
        for case in &lesson.test_cases {
            verdicts.push(self.run_case(&scratch, &executable, case).await?);
        }

        let outcome = ValidationOutcome::from_verdicts(verdicts);
        info!(
            lesson_id,
            passed = outcome.verdicts.iter().filter(|v| v.passed).count(),
            total = outcome.verdicts.len(),
            "Submission graded"
        );
        Ok(outcome)
    }

    async fn run_case(
        &self,
        scratch: &ScratchArea,
        executable: &std::path::Path,
        case: &TestCase,
    ) -> Result<TestVerdict> {
        let output = run_with_input(
            executable,
            std::iter::empty::<&str>(),
            Some(scratch.path()),
            &case.input,
            &self.limits,
        )
        .await?;

        let passed = output.succeeded() && outputs_match(&output.output, &case.expected_output);
        debug!(
            description = %case.description,
            passed,
            termination = ?output.termination,
            "Test case finished"
        );

        Ok(TestVerdict {
            description: case.description.clone(),
            passed,
            expected_output: case.expected_output.clone(),
            timed_out: output.timed_out(),
            exit_code: output.exit_code(),
            actual_output: output.output,
        })
    }
}
