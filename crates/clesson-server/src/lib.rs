//! clesson Server
//!
//! Serves C lessons, grades submissions against their test cases, and gates
//! progression on lesson prerequisites.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gate;
pub mod grader;
pub mod lesson;
pub mod progress;

pub use api::{
    create_router, AppState, ErrorResponse, HealthResponse, ValidateRequest, ValidateResponse,
};
pub use catalog::{Catalog, DirectoryLessonSource, LessonSource};
pub use config::{Config, CONFIG_FILE_NAME, DEFAULT_PORT};
pub use error::{Result, ServerError};
pub use gate::{PrerequisiteGate, ProgressReport};
pub use grader::{Grader, TestVerdict, ValidationOutcome};
pub use lesson::{Lesson, LessonId, LessonSummary, TestCase};
pub use progress::{ProgressStore, UserProgress, FIRST_LESSON};
