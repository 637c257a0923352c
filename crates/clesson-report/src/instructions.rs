//! Markdown instructions for a lesson workspace.
//!
//! [`InstructionsGenerator`] renders the `README.md` placed next to the
//! learner's `solution.c`. It is rewritten every time the lesson is opened,
//! so it always reflects the current lesson content.

use std::fmt::Write;

use crate::{LessonInput, TestCaseInput};

/// Renders a lesson as Markdown instructions.
pub struct InstructionsGenerator<'a> {
    lesson: &'a LessonInput,
}

impl<'a> InstructionsGenerator<'a> {
    /// Creates a generator for `lesson`.
    #[must_use]
    pub const fn new(lesson: &'a LessonInput) -> Self {
        Self { lesson }
    }

    /// Renders the full document.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();

        self.write_title(&mut output);
        self.write_objectives(&mut output);
        self.write_example(&mut output);
        self.write_test_cases(&mut output);
        Self::write_next_steps(&mut output);

        output
    }

    fn write_title(&self, output: &mut String) {
        let _ = writeln!(
            output,
            "# Lesson {}: {}\n",
            self.lesson.id,
            self.lesson.title.trim()
        );

        if !self.lesson.prerequisites.is_empty() {
            let prereqs = self
                .lesson
                .prerequisites
                .iter()
                .map(|id| format!("Lesson {id}"))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(output, "*Requires: {prereqs}*\n");
        }

        let description = self.lesson.description.trim();
        if !description.is_empty() {
            let _ = writeln!(output, "{description}\n");
        }
    }

    fn write_objectives(&self, output: &mut String) {
        if self.lesson.objectives.is_empty() {
            return;
        }
        let _ = writeln!(output, "## Learning Objectives\n");
        for objective in &self.lesson.objectives {
            let _ = writeln!(output, "- {}", objective.trim());
        }
        let _ = writeln!(output);
    }

    fn write_example(&self, output: &mut String) {
        let code = self.lesson.example_code.trim_end();
        if code.is_empty() {
            return;
        }
        let _ = writeln!(output, "## Example Code\n");
        let fence = code_fence(code);
        let _ = writeln!(output, "{fence}c\n{code}\n{fence}\n");
    }

    fn write_test_cases(&self, output: &mut String) {
        if self.lesson.test_cases.is_empty() {
            return;
        }
        let _ = writeln!(output, "## Test Cases\n");
        let _ = writeln!(output, "| # | Description | Input | Expected Output |");
        let _ = writeln!(output, "|---|-------------|-------|-----------------|");
        for (index, case) in self.lesson.test_cases.iter().enumerate() {
            Self::write_test_case(output, index + 1, case);
        }
        let _ = writeln!(output);
    }

    fn write_test_case(output: &mut String, number: usize, case: &TestCaseInput) {
        let description = escape_markdown(case.description.trim());
        let input = table_code(&case.input);
        let expected = table_code(&case.expected_output);
        let _ = writeln!(output, "| {number} | {description} | {input} | {expected} |");
    }

    fn write_next_steps(output: &mut String) {
        let _ = writeln!(output, "## To complete this lesson\n");
        let _ = writeln!(output, "1. Edit `solution.c`");
        let _ = writeln!(output, "2. Build locally with `make` if you like");
        let _ = writeln!(output, "3. Run `clesson test` to check your solution");
        let _ = writeln!(
            output,
            "4. Once all tests pass, run `clesson next` to move on"
        );
    }
}

/// Escapes Markdown special characters for use in table cells.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '*' | '_' | '`' | '#' | '[' | ']' | '<' | '>' | '|' | '\\' => {
                result.push('\\');
                result.push(ch);
            }
            '\n' => result.push_str("<br>"),
            _ => result.push(ch),
        }
    }

    result
}

/// A backtick fence longer than any backtick run in `code`, minimum three.
fn code_fence(code: &str) -> String {
    let longest = code
        .split(|ch| ch != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

/// Renders program text as inline code inside a table cell.
fn table_code(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "*(none)*".to_string();
    }
    let cells = trimmed
        .lines()
        .map(|line| format!("`{}`", line.replace('`', "'").replace('|', "\\|")))
        .collect::<Vec<_>>();
    cells.join("<br>")
}
