//! Progress tracking and prerequisite gating over HTTP.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;

use clesson_report::{ProgressGenerator, ProgressInput};
use clesson_server::Config;
use reqwest::StatusCode;

use common::{
    compiler_available, progress, repo_catalog, spawn_test_server, submit, HELLO_SOLUTION,
    VARIABLES_SOLUTION,
};

#[tokio::test]
async fn test_new_learner_starts_at_first_lesson() {
    let (base, _handle) = spawn_test_server(repo_catalog(), &Config::default()).await;

    let report = progress(&base, "newcomer").await;

    assert_eq!(report["userId"], "newcomer");
    assert_eq!(report["currentLesson"], 1);
    assert_eq!(report["completedLessons"], serde_json::json!([]));
    assert_eq!(report["completionPercentage"], 0.0);
    assert_eq!(report["nextLesson"], 1);
}

#[tokio::test]
async fn test_locked_lesson_is_forbidden() {
    let (base, _handle) = spawn_test_server(repo_catalog(), &Config::default()).await;

    let (status, body) = submit(&base, 3, "int main(void) { return 0; }", Some("eager")).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"],
        "lesson 3 requires completing lessons [2] first"
    );
    assert_eq!(progress(&base, "eager").await["currentLesson"], 1);
}

#[tokio::test]
async fn test_anonymous_submission_skips_gate() {
    if !compiler_available() {
        return;
    }
    let (base, _handle) = spawn_test_server(repo_catalog(), &Config::default()).await;

    let (status, body) = submit(&base, 2, VARIABLES_SOLUTION, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isValid"], true, "{body}");
}

#[tokio::test]
async fn test_passing_submission_advances_learner() {
    if !compiler_available() {
        return;
    }
    let (base, _handle) = spawn_test_server(repo_catalog(), &Config::default()).await;

    let (_, body) = submit(&base, 1, HELLO_SOLUTION, Some("ada")).await;
    assert_eq!(body["canProceed"], true);

    let report = progress(&base, "ada").await;
    assert_eq!(report["currentLesson"], 2);
    assert_eq!(report["completedLessons"], serde_json::json!([1]));
    assert_eq!(report["nextLesson"], 2);

    let percentage = report["completionPercentage"].as_f64().unwrap();
    assert!((percentage - 100.0 / 3.0).abs() < 1e-9);

    // Lesson 2 is unlocked now.
    let (status, body) = submit(&base, 2, VARIABLES_SOLUTION, Some("ada")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isValid"], true, "{body}");
    assert_eq!(progress(&base, "ada").await["currentLesson"], 3);
}

#[tokio::test]
async fn test_failed_submission_leaves_progress_unchanged() {
    if !compiler_available() {
        return;
    }
    let (base, _handle) = spawn_test_server(repo_catalog(), &Config::default()).await;

    let (status, body) = submit(&base, 1, "int main(void) { return 0 }", Some("grace")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["canProceed"], false);

    let report = progress(&base, "grace").await;
    assert_eq!(report["currentLesson"], 1);
    assert_eq!(report["completedLessons"], serde_json::json!([]));
}

#[tokio::test]
async fn test_resubmitting_completed_lesson_is_idempotent() {
    if !compiler_available() {
        return;
    }
    let (base, _handle) = spawn_test_server(repo_catalog(), &Config::default()).await;

    submit(&base, 1, HELLO_SOLUTION, Some("linus")).await;
    submit(&base, 1, HELLO_SOLUTION, Some("linus")).await;

    let report = progress(&base, "linus").await;
    assert_eq!(report["completedLessons"], serde_json::json!([1]));
    assert_eq!(report["currentLesson"], 2);
}

#[tokio::test]
async fn test_concurrent_submissions_for_one_learner() {
    if !compiler_available() {
        return;
    }
    let (base, _handle) = spawn_test_server(repo_catalog(), &Config::default()).await;

    let submissions: Vec<_> = (0..4)
        .map(|_| {
            let base = base.clone();
            tokio::spawn(async move { submit(&base, 1, HELLO_SOLUTION, Some("many")).await })
        })
        .collect();
    for handle in submissions {
        let (status, _) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    let report = progress(&base, "many").await;
    assert_eq!(report["completedLessons"], serde_json::json!([1]));
    assert_eq!(report["currentLesson"], 2);
}

#[tokio::test]
async fn test_progress_report_renders_as_text() {
    let (base, _handle) = spawn_test_server(repo_catalog(), &Config::default()).await;

    let input: ProgressInput = serde_json::from_value(progress(&base, "reader").await).unwrap();
    let text = ProgressGenerator::new(&input).generate();

    assert!(text.contains("User: reader"));
    assert!(text.contains("Completion: 0.0%"));
}
