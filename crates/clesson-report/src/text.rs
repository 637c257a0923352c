//! Plain-text rendering for the terminal.

use std::fmt::Write;

use crate::{ProgressInput, TestResultInput, ValidationInput};

/// Indentation for detail lines under a test result.
const DETAIL_INDENT: &str = "    ";

/// Renders a graded submission as a pass/fail listing.
pub struct ResultsGenerator<'a> {
    lesson_id: u32,
    validation: &'a ValidationInput,
}

impl<'a> ResultsGenerator<'a> {
    /// Creates a generator for the results of `lesson_id`.
    #[must_use]
    pub const fn new(lesson_id: u32, validation: &'a ValidationInput) -> Self {
        Self {
            lesson_id,
            validation,
        }
    }

    /// Renders the listing.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(
            output,
            "=== Test Results for Lesson {} ===\n",
            self.lesson_id
        );

        if self.validation.is_compile_failure() {
            let _ = writeln!(output, "Compilation failed:\n");
            let _ = writeln!(output, "{}", self.validation.feedback.trim_end());
            return output;
        }

        for (index, result) in self.validation.test_results.iter().enumerate() {
            Self::write_result(&mut output, index + 1, result);
        }

        let _ = writeln!(output);
        let _ = writeln!(output, "{}", self.validation.feedback);
        if self.validation.can_proceed {
            let _ = writeln!(output, "Run 'clesson next' to continue with the next lesson.");
        }
        output
    }

    fn write_result(output: &mut String, number: usize, result: &TestResultInput) {
        let icon = if result.passed { '✓' } else { '✗' };
        let description = if result.description.is_empty() {
            format!("Test {number}")
        } else {
            result.description.clone()
        };
        let _ = writeln!(output, "{icon} {description}");

        if result.passed {
            return;
        }

        let _ = writeln!(
            output,
            "{DETAIL_INDENT}Expected: {}",
            display_output(&result.expected_output)
        );
        let _ = writeln!(
            output,
            "{DETAIL_INDENT}Got: {}",
            display_output(&result.actual_output)
        );

        if result.timed_out {
            let _ = writeln!(output, "{DETAIL_INDENT}Timed out");
        } else {
            match result.exit_code {
                Some(0) => {}
                Some(code) => {
                    let _ = writeln!(output, "{DETAIL_INDENT}Exit code: {code}");
                }
                None => {
                    let _ = writeln!(output, "{DETAIL_INDENT}Terminated by a signal");
                }
            }
        }
    }
}

/// Renders a learner's progress.
pub struct ProgressGenerator<'a> {
    progress: &'a ProgressInput,
}

impl<'a> ProgressGenerator<'a> {
    /// Creates a generator for `progress`.
    #[must_use]
    pub const fn new(progress: &'a ProgressInput) -> Self {
        Self { progress }
    }

    /// Renders the summary.
    #[must_use]
    pub fn generate(&self) -> String {
        let completed = if self.progress.completed_lessons.is_empty() {
            "none".to_string()
        } else {
            self.progress
                .completed_lessons
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut output = String::new();
        let _ = writeln!(output, "=== Your Progress ===\n");
        let _ = writeln!(output, "User: {}", self.progress.user_id);
        let _ = writeln!(output, "Current lesson: {}", self.progress.current_lesson);
        let _ = writeln!(output, "Completed lessons: {completed}");
        let _ = writeln!(
            output,
            "Completion: {:.1}%",
            self.progress.completion_percentage
        );
        let _ = writeln!(output, "Next lesson: {}", self.progress.next_lesson);
        output
    }
}

/// Formats program output for a single display line.
///
/// Surrounding whitespace is dropped, matching how outputs are compared, and
/// continuation lines are indented under the first.
fn display_output(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "(no output)".to_string();
    }
    trimmed.replace('\n', &format!("\n{DETAIL_INDENT}  "))
}
