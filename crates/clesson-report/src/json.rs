//! JSON rendering.
//!
//! [`JsonGenerator`] serializes any report input as compact or pretty JSON,
//! for `--json` output and for scripts that consume the CLI.
//!
//! # Example
//!
//! ```rust
//! use clesson_report::{json::JsonGenerator, ProgressInput};
//!
//! let progress = ProgressInput {
//!     user_id: "learner".to_string(),
//!     current_lesson: 2,
//!     completed_lessons: vec![1],
//!     completion_percentage: 50.0,
//!     next_lesson: 2,
//! };
//!
//! let json = JsonGenerator::new(&progress).generate().unwrap();
//! assert!(json.contains(r#""currentLesson":2"#));
//! ```

use serde::Serialize;

use crate::{ReportError, Result};

/// JSON generator over a borrowed value.
pub struct JsonGenerator<'a, T: ?Sized> {
    value: &'a T,
}

impl<'a, T> JsonGenerator<'a, T>
where
    T: Serialize + ?Sized,
{
    /// Creates a new JSON generator for `value`.
    #[must_use]
    pub const fn new(value: &'a T) -> Self {
        Self { value }
    }

    /// Generates compact JSON (single line).
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if serialization fails.
    pub fn generate(&self) -> Result<String> {
        serde_json::to_string(self.value).map_err(ReportError::from)
    }

    /// Generates pretty-printed JSON with two-space indentation.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if serialization fails.
    pub fn generate_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self.value).map_err(ReportError::from)
    }
}
