//! Prerequisite gating.
//!
//! The gate decides whether a learner may attempt a lesson, which lesson
//! comes next, and records completions. It is the only writer of
//! [`UserProgress`].

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::Catalog;
use crate::error::{Result, ServerError};
use crate::lesson::LessonId;
use crate::progress::{ProgressStore, UserProgress};

/// A learner's progress together with derived values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    /// Opaque learner id.
    pub user_id: String,
    /// Lesson the learner is working on.
    pub current_lesson: LessonId,
    /// Completed lessons, ascending.
    pub completed_lessons: Vec<LessonId>,
    /// Share of the catalog completed, 0 to 100.
    pub completion_percentage: f64,
    /// Lesson the learner should attempt next.
    pub next_lesson: LessonId,
}

/// Applies catalog prerequisites to learner progress.
#[derive(Debug, Clone)]
pub struct PrerequisiteGate {
    catalog: Arc<Catalog>,
    store: Arc<ProgressStore>,
}

impl PrerequisiteGate {
    /// Creates a gate over `catalog` that records into `store`.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, store: Arc<ProgressStore>) -> Self {
        Self { catalog, store }
    }

    /// Returns the progress store.
    #[must_use]
    pub fn store(&self) -> &Arc<ProgressStore> {
        &self.store
    }

    /// Prerequisites of `lesson_id` the learner has not completed.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::LessonNotFound` for an unknown lesson.
    pub fn missing_prerequisites(
        &self,
        progress: &UserProgress,
        lesson_id: LessonId,
    ) -> Result<Vec<LessonId>> {
        let lesson = self.catalog.get(lesson_id)?;
        Ok(lesson
            .prerequisites
            .iter()
            .copied()
            .filter(|id| !progress.has_completed(*id))
            .collect())
    }

    /// Returns `true` if every prerequisite of `lesson_id` is completed.
    /// Unknown lessons can never be attempted.
    #[must_use]
    pub fn can_attempt(&self, progress: &UserProgress, lesson_id: LessonId) -> bool {
        self.missing_prerequisites(progress, lesson_id)
            .is_ok_and(|missing| missing.is_empty())
    }

    /// Fails unless the learner may attempt `lesson_id`.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::LessonNotFound` for an unknown lesson and
    /// `ServerError::PrerequisitesNotMet` when prerequisites are missing.
    pub async fn check_attempt(&self, user_id: &str, lesson_id: LessonId) -> Result<()> {
        let progress = self.store.snapshot(user_id).await;
        let missing = self.missing_prerequisites(&progress, lesson_id)?;
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ServerError::prerequisites_not_met(lesson_id, missing))
        }
    }

    /// Marks `lesson_id` completed for the learner.
    ///
    /// Recording the same lesson twice changes nothing. The current lesson
    /// advances to the numeric successor only when the learner completes the
    /// lesson it points at.
    pub async fn record_success(&self, user_id: &str, lesson_id: LessonId) -> UserProgress {
        self.store
            .update(user_id, |progress| {
                if !progress.completed_lessons.insert(lesson_id) {
                    return;
                }
                if progress.current_lesson == lesson_id {
                    progress.current_lesson = lesson_id.saturating_add(1);
                }
                progress.updated_at = Utc::now();
                info!(
                    user_id,
                    lesson_id,
                    current_lesson = progress.current_lesson,
                    "Recorded lesson completion"
                );
            })
            .await
    }

    /// Lesson the learner should attempt next.
    ///
    /// Scans forward from the current lesson and returns the first lesson
    /// whose prerequisites are met. If the scan reaches an id that is not in
    /// the catalog, the current lesson is returned unchanged.
    #[must_use]
    pub fn next_available(&self, progress: &UserProgress) -> LessonId {
        let mut candidate = progress.current_lesson;
        loop {
            if !self.catalog.contains(candidate) {
                return progress.current_lesson;
            }
            if self.can_attempt(progress, candidate) {
                return candidate;
            }
            match candidate.checked_add(1) {
                Some(next) => candidate = next,
                None => return progress.current_lesson,
            }
        }
    }

    /// Percentage of the catalog the learner has completed.
    ///
    /// An empty catalog yields `0.0`.
    #[must_use]
    pub fn completion_percentage(&self, progress: &UserProgress) -> f64 {
        let total = u32::try_from(self.catalog.len()).unwrap_or(u32::MAX);
        if total == 0 {
            return 0.0;
        }
        let completed = u32::try_from(progress.completed_lessons.len()).unwrap_or(u32::MAX);
        f64::from(completed) / f64::from(total) * 100.0
    }

    /// Builds the full progress view for a learner, creating the record if
    /// needed.
    pub async fn report(&self, user_id: &str) -> ProgressReport {
        let progress = self.store.snapshot(user_id).await;
        ProgressReport {
            completion_percentage: self.completion_percentage(&progress),
            next_lesson: self.next_available(&progress),
            completed_lessons: progress.completed_lessons.iter().copied().collect(),
            current_lesson: progress.current_lesson,
            user_id: progress.user_id,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::lesson::Lesson;

    fn gate_with(lessons: Vec<Lesson>) -> PrerequisiteGate {
        PrerequisiteGate::new(
            Arc::new(Catalog::from_lessons(lessons).unwrap()),
            Arc::new(ProgressStore::new()),
        )
    }

    fn three_lessons() -> PrerequisiteGate {
        gate_with(vec![
            Lesson::new(1, "Hello"),
            Lesson::new(2, "Variables").with_prerequisite(1),
            Lesson::new(3, "Input").with_prerequisite(2),
        ])
    }

    #[tokio::test]
    async fn test_next_available_follows_completion() {
        let gate = three_lessons();

        let fresh = gate.store().snapshot("u").await;
        assert_eq!(gate.next_available(&fresh), 1);

        let after = gate.record_success("u", 1).await;
        assert_eq!(after.current_lesson, 2);
        assert_eq!(gate.next_available(&after), 2);
    }

    #[tokio::test]
    async fn test_next_available_past_catalog_returns_current() {
        let gate = three_lessons();
        for id in 1..=3 {
            gate.record_success("u", id).await;
        }
        let progress = gate.store().snapshot("u").await;

        assert_eq!(progress.current_lesson, 4);
        assert_eq!(gate.next_available(&progress), 4);
    }

    #[test]
    fn test_next_available_stops_at_gap() {
        let gate = gate_with(vec![
            Lesson::new(1, "a"),
            Lesson::new(2, "b").with_prerequisite(9),
            Lesson::new(4, "d"),
        ]);
        let mut progress = UserProgress::new("u");
        progress.current_lesson = 2;

        // 2 is blocked and 3 is absent, so the scan gives back the current lesson.
        assert_eq!(gate.next_available(&progress), 2);
    }

    #[test]
    fn test_next_available_skips_blocked_lessons() {
        let gate = gate_with(vec![
            Lesson::new(1, "a").with_prerequisite(3),
            Lesson::new(2, "b"),
            Lesson::new(3, "c"),
        ]);
        let progress = UserProgress::new("u");
        assert_eq!(gate.next_available(&progress), 2);
    }

    #[test]
    fn test_next_available_at_max_id() {
        let gate = gate_with(vec![Lesson::new(u32::MAX, "last").with_prerequisite(1)]);
        let mut progress = UserProgress::new("u");
        progress.current_lesson = u32::MAX;
        assert_eq!(gate.next_available(&progress), u32::MAX);
    }

    #[tokio::test]
    async fn test_out_of_order_completion_keeps_current() {
        let gate = three_lessons();
        let progress = gate.record_success("u", 3).await;

        assert!(progress.has_completed(3));
        assert_eq!(progress.current_lesson, 1);
    }

    #[tokio::test]
    async fn test_record_success_is_idempotent() {
        let gate = three_lessons();
        let first = gate.record_success("u", 1).await;
        let second = gate.record_success("u", 1).await;

        assert_eq!(first, second);
        assert_eq!(second.current_lesson, 2);
        assert_eq!(second.completed_lessons.len(), 1);
    }

    #[tokio::test]
    async fn test_check_attempt() {
        let gate = three_lessons();

        assert!(gate.check_attempt("u", 1).await.is_ok());
        let err = gate.check_attempt("u", 2).await.unwrap_err();
        assert!(
            matches!(&err, ServerError::PrerequisitesNotMet { lesson_id: 2, missing } if missing == &vec![1])
        );
        assert!(matches!(
            gate.check_attempt("u", 99).await,
            Err(ServerError::LessonNotFound { id: 99 })
        ));

        gate.record_success("u", 1).await;
        assert!(gate.check_attempt("u", 2).await.is_ok());
    }

    #[test]
    fn test_can_attempt_unknown_lesson_is_false() {
        let gate = three_lessons();
        assert!(!gate.can_attempt(&UserProgress::new("u"), 42));
    }

    #[test]
    fn test_can_attempt_missing_prerequisite_lesson() {
        let gate = gate_with(vec![Lesson::new(1, "a").with_prerequisite(7)]);
        assert!(!gate.can_attempt(&UserProgress::new("u"), 1));
    }

    #[test]
    fn test_can_attempt_ignores_unrelated_completions() {
        let gate = gate_with(vec![
            Lesson::new(1, "a"),
            Lesson::new(2, "b").with_prerequisite(1),
            Lesson::new(5, "e"),
            Lesson::new(9, "i"),
        ]);
        let mut progress = UserProgress::new("u");
        progress.completed_lessons.extend([5, 9]);

        assert!(!gate.can_attempt(&progress, 2));

        progress.completed_lessons.insert(1);
        assert!(gate.can_attempt(&progress, 2));
    }

    #[tokio::test]
    async fn test_completion_percentage() {
        let gate = three_lessons();
        assert_eq!(
            gate.completion_percentage(&gate.store().snapshot("u").await),
            0.0
        );

        for id in 1..=3 {
            gate.record_success("u", id).await;
        }
        assert_eq!(
            gate.completion_percentage(&gate.store().snapshot("u").await),
            100.0
        );
    }

    #[test]
    fn test_completion_percentage_empty_catalog() {
        let gate = gate_with(Vec::new());
        let mut progress = UserProgress::new("u");
        progress.completed_lessons.insert(1);

        let pct = gate.completion_percentage(&progress);
        assert_eq!(pct, 0.0);
        assert!(!pct.is_nan());
    }

    #[tokio::test]
    async fn test_report() {
        let gate = three_lessons();
        gate.record_success("u", 1).await;

        let report = gate.report("u").await;

        assert_eq!(report.user_id, "u");
        assert_eq!(report.current_lesson, 2);
        assert_eq!(report.completed_lessons, vec![1]);
        assert_eq!(report.next_lesson, 2);
        assert!((report.completion_percentage - 100.0 / 3.0).abs() < 1e-9);
    }
}
