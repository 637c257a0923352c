//! Lesson content types.
//!
//! Lessons are serialized as camelCase JSON over HTTP. Test cases also accept
//! the snake_case `expected_output` key used by the on-disk `tests.json`
//! files, so the same type reads both.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Unique, positive lesson identifier.
pub type LessonId = u32;

/// A single graded case: stdin input and the output it must produce.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    /// Text fed to the program on stdin.
    #[serde(default)]
    pub input: String,

    /// Output the program must print, compared after trimming.
    #[serde(alias = "expected_output")]
    pub expected_output: String,

    /// Human-readable description shown next to the verdict.
    #[serde(default)]
    pub description: String,
}

impl TestCase {
    /// Creates a new test case.
    #[must_use]
    pub fn new(
        input: impl Into<String>,
        expected_output: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            expected_output: expected_output.into(),
            description: description.into(),
        }
    }
}

/// A unit of instructional content with its test suite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    /// Catalog key.
    pub id: LessonId,

    /// Short title.
    pub title: String,

    /// Lesson body text.
    pub description: String,

    /// Worked example in C.
    #[serde(default)]
    pub example_code: String,

    /// What the learner should be able to do afterwards.
    #[serde(default)]
    pub objectives: Vec<String>,

    /// Test cases, in display order.
    #[serde(default)]
    pub test_cases: Vec<TestCase>,

    /// Lessons that must be completed first.
    #[serde(default)]
    pub prerequisites: BTreeSet<LessonId>,
}

impl Lesson {
    /// Creates a lesson with the given id and title and no content.
    #[must_use]
    pub fn new(id: LessonId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the example code.
    #[must_use]
    pub fn with_example_code(mut self, code: impl Into<String>) -> Self {
        self.example_code = code.into();
        self
    }

    /// Adds a learning objective.
    #[must_use]
    pub fn with_objective(mut self, objective: impl Into<String>) -> Self {
        self.objectives.push(objective.into());
        self
    }

    /// Adds a test case.
    #[must_use]
    pub fn with_test_case(mut self, test_case: TestCase) -> Self {
        self.test_cases.push(test_case);
        self
    }

    /// Adds a prerequisite lesson.
    #[must_use]
    pub fn with_prerequisite(mut self, id: LessonId) -> Self {
        self.prerequisites.insert(id);
        self
    }

    /// Returns a listing entry for this lesson.
    #[must_use]
    pub fn summary(&self) -> LessonSummary {
        LessonSummary {
            id: self.id,
            title: self.title.clone(),
            prerequisites: self.prerequisites.iter().copied().collect(),
        }
    }
}

/// Catalog listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonSummary {
    /// Lesson id.
    pub id: LessonId,
    /// Lesson title.
    pub title: String,
    /// Prerequisite ids, ascending.
    pub prerequisites: Vec<LessonId>,
}
