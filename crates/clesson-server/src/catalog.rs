//! The lesson catalog and the sources it is built from.
//!
//! A [`Catalog`] is assembled once at startup from a [`LessonSource`] and is
//! read-only afterwards. Any lesson that fails to load aborts the build; there
//! is no partial catalog.
//!
//! # Directory layout
//!
//! [`DirectoryLessonSource`] walks a directory tree. Every `lesson.json` it
//! finds describes one lesson and must sit next to an `example.c` and a
//! `tests.json`:
//!
//! ```text
//! lessons/
//! └── fundamentals/
//!     └── 01_hello/
//!         ├── lesson.json
//!         ├── example.c
//!         └── tests.json
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Result, ServerError};
use crate::lesson::{Lesson, LessonId, LessonSummary, TestCase};

/// File name that marks a lesson directory.
pub const DESCRIPTOR_FILE: &str = "lesson.json";

/// Example source paired with each descriptor.
pub const EXAMPLE_FILE: &str = "example.c";

/// Test case list paired with each descriptor.
pub const TESTS_FILE: &str = "tests.json";

/// Anything that can yield the full set of lessons.
pub trait LessonSource {
    /// Loads every lesson, failing if any one of them cannot be loaded.
    fn load_lessons(&self) -> Result<Vec<Lesson>>;
}

impl LessonSource for Vec<Lesson> {
    fn load_lessons(&self) -> Result<Vec<Lesson>> {
        Ok(self.clone())
    }
}

/// Read-only mapping from lesson id to lesson.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    lessons: BTreeMap<LessonId, Lesson>,
}

impl Catalog {
    /// Builds a catalog from a lesson source.
    ///
    /// # Errors
    ///
    /// Returns whatever the source returns, plus the errors of
    /// [`Catalog::from_lessons`].
    pub fn load(source: &dyn LessonSource) -> Result<Self> {
        let catalog = Self::from_lessons(source.load_lessons()?)?;
        info!(lessons = catalog.len(), "Lesson catalog loaded");
        Ok(catalog)
    }

    /// Builds a catalog from already-loaded lessons.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::InvalidLessonId` for id 0 and
    /// `ServerError::DuplicateLesson` if two lessons share an id.
    pub fn from_lessons(lessons: impl IntoIterator<Item = Lesson>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for lesson in lessons {
            if lesson.id == 0 {
                return Err(ServerError::InvalidLessonId {
                    title: lesson.title,
                });
            }
            let id = lesson.id;
            if map.insert(id, lesson).is_some() {
                return Err(ServerError::DuplicateLesson { id });
            }
        }

        let catalog = Self { lessons: map };
        catalog.warn_unknown_prerequisites();
        Ok(catalog)
    }

    fn warn_unknown_prerequisites(&self) {
        for lesson in self.lessons.values() {
            for prereq in &lesson.prerequisites {
                if !self.contains(*prereq) {
                    warn!(
                        lesson_id = lesson.id,
                        prerequisite = prereq,
                        "Lesson requires a lesson that is not in the catalog; it can never be attempted"
                    );
                }
            }
        }
    }

    /// Looks up a lesson by id.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::LessonNotFound` if the id is absent.
    pub fn get(&self, id: LessonId) -> Result<&Lesson> {
        self.lessons
            .get(&id)
            .ok_or(ServerError::lesson_not_found(id))
    }

    /// Returns `true` if the catalog has a lesson with this id.
    #[must_use]
    pub fn contains(&self, id: LessonId) -> bool {
        self.lessons.contains_key(&id)
    }

    /// Number of lessons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    /// Returns `true` if the catalog has no lessons.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    /// All lesson ids, ascending.
    pub fn ids(&self) -> impl Iterator<Item = LessonId> + '_ {
        self.lessons.keys().copied()
    }

    /// Listing entries for every lesson, ascending by id.
    #[must_use]
    pub fn summaries(&self) -> Vec<LessonSummary> {
        self.lessons.values().map(Lesson::summary).collect()
    }
}

/// On-disk `lesson.json` shape.
#[derive(Debug, Deserialize)]
struct LessonDescriptor {
    id: LessonId,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    learning_objectives: Vec<String>,
    #[serde(default)]
    prerequisites: BTreeSet<LessonId>,
}

/// Loads lessons from a directory tree of `lesson.json` descriptors.
#[derive(Debug, Clone)]
pub struct DirectoryLessonSource {
    root: PathBuf,
}

impl DirectoryLessonSource {
    /// Creates a source rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load_lesson(descriptor_path: &Path) -> Result<Lesson> {
        let dir = descriptor_path.parent().unwrap_or_else(|| Path::new("."));

        let descriptor: LessonDescriptor =
            serde_json::from_str(&read_file(descriptor_path)?)
                .map_err(|e| ServerError::lesson_load(descriptor_path, e.to_string()))?;

        let example_code = read_file(&dir.join(EXAMPLE_FILE))?;

        let tests_path = dir.join(TESTS_FILE);
        let test_cases: Vec<TestCase> = serde_json::from_str(&read_file(&tests_path)?)
            .map_err(|e| ServerError::lesson_load(&tests_path, e.to_string()))?;

        debug!(
            lesson_id = descriptor.id,
            title = %descriptor.title,
            tests = test_cases.len(),
            "Loaded lesson"
        );

        Ok(Lesson {
            id: descriptor.id,
            title: descriptor.title,
            description: descriptor.description,
            example_code,
            objectives: descriptor.learning_objectives,
            test_cases,
            prerequisites: descriptor.prerequisites,
        })
    }
}

impl LessonSource for DirectoryLessonSource {
    fn load_lessons(&self) -> Result<Vec<Lesson>> {
        if !self.root.is_dir() {
            return Err(ServerError::lessons_dir_not_found(&self.root));
        }

        let descriptors = find_descriptors(&self.root)?;

        descriptors
            .iter()
            .map(|path| Self::load_lesson(path))
            .collect()
    }
}

/// Collects every `lesson.json` under `root`, in file-name order.
///
/// Symlinks are followed; a link cycle or an unreadable entry fails the load.
fn find_descriptors(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            ServerError::lesson_load(path, e.to_string())
        })?;
        if entry.file_type().is_file() && entry.file_name() == DESCRIPTOR_FILE {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| ServerError::lesson_load(path, e.to_string()))
}
