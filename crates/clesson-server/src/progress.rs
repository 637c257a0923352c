//! Per-learner progress records.
//!
//! The store is partitioned by user id. Each learner's record sits behind
//! its own mutex, so concurrent submissions from one learner are serialized
//! while different learners only share the brief map lookup.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::lesson::LessonId;

/// The lesson every new learner starts on.
pub const FIRST_LESSON: LessonId = 1;

/// One learner's progression through the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    /// Opaque learner id.
    pub user_id: String,

    /// Lesson the learner is working on.
    pub current_lesson: LessonId,

    /// Lessons passed so far. Only ever grows.
    pub completed_lessons: BTreeSet<LessonId>,

    /// When this record last changed.
    pub updated_at: DateTime<Utc>,
}

impl UserProgress {
    /// Creates a fresh record starting at the first lesson.
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            current_lesson: FIRST_LESSON,
            completed_lessons: BTreeSet::new(),
            updated_at: Utc::now(),
        }
    }

    /// Returns `true` if `lesson_id` has been completed.
    #[must_use]
    pub fn has_completed(&self, lesson_id: LessonId) -> bool {
        self.completed_lessons.contains(&lesson_id)
    }
}

/// In-memory table of learner progress.
#[derive(Debug, Default)]
pub struct ProgressStore {
    records: RwLock<HashMap<String, Arc<Mutex<UserProgress>>>>,
}

impl ProgressStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record for `user_id`, creating it on first access.
    async fn entry(&self, user_id: &str) -> Arc<Mutex<UserProgress>> {
        if let Some(record) = self.records.read().await.get(user_id) {
            return Arc::clone(record);
        }

        let mut records = self.records.write().await;
        Arc::clone(records.entry(user_id.to_string()).or_insert_with(|| {
            debug!(user_id, "Creating progress record");
            Arc::new(Mutex::new(UserProgress::new(user_id)))
        }))
    }

    /// Returns a copy of the learner's current progress.
    pub async fn snapshot(&self, user_id: &str) -> UserProgress {
        let record = self.entry(user_id).await;
        let progress = record.lock().await;
        progress.clone()
    }

    /// Runs `f` on the learner's record while holding its lock and returns
    /// the resulting state.
    pub async fn update<F>(&self, user_id: &str, f: F) -> UserProgress
    where
        F: FnOnce(&mut UserProgress),
    {
        let record = self.entry(user_id).await;
        let mut progress = record.lock().await;
        f(&mut progress);
        progress.clone()
    }

    /// Number of learners with a record.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns `true` if no learner has a record yet.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}
