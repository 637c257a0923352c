//! End-to-end grading over HTTP against the shipped lessons.
//!
//! Tests that compile C skip themselves when `gcc` is not installed.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;

use clesson_server::Config;
use reqwest::StatusCode;

use common::{
    compiler_available, repo_catalog, spawn_test_server, submit, HELLO_SOLUTION, SUM_SOLUTION,
    VARIABLES_SOLUTION,
};

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_health_reports_shipped_lessons() {
    let (base, _handle) = spawn_test_server(repo_catalog(), &Config::default()).await;

    let health: serde_json::Value = reqwest::get(format!("{base}/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(health["status"], "ok");
    assert_eq!(health["lessons"], 3);
}

#[tokio::test]
async fn test_lesson_listing_is_ordered_with_prerequisites() {
    let (base, _handle) = spawn_test_server(repo_catalog(), &Config::default()).await;

    let lessons: Vec<serde_json::Value> = reqwest::get(format!("{base}/api/lessons"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let ids: Vec<u64> = lessons.iter().map(|l| l["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(lessons[0]["prerequisites"], serde_json::json!([]));
    assert_eq!(lessons[2]["prerequisites"], serde_json::json!([2]));
}

#[tokio::test]
async fn test_get_lesson_includes_example_and_tests() {
    let (base, _handle) = spawn_test_server(repo_catalog(), &Config::default()).await;

    let lesson: serde_json::Value = reqwest::get(format!("{base}/api/lessons/1"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(lesson["id"], 1);
    assert!(lesson["exampleCode"].as_str().unwrap().contains("printf"));
    assert_eq!(lesson["testCases"][0]["expectedOutput"], "Hello, World!\n");
}

#[tokio::test]
async fn test_unknown_lesson_is_not_found() {
    let (base, _handle) = spawn_test_server(repo_catalog(), &Config::default()).await;

    let response = reqwest::get(format!("{base}/api/lessons/42")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "lesson 42 not found");
}

// ============================================================================
// Grading
// ============================================================================

#[tokio::test]
async fn test_hello_world_passes() {
    if !compiler_available() {
        return;
    }
    let (base, _handle) = spawn_test_server(repo_catalog(), &Config::default()).await;

    let (status, body) = submit(&base, 1, HELLO_SOLUTION, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isValid"], true);
    assert_eq!(body["canProceed"], true);
    assert_eq!(body["testResults"][0]["actualOutput"], "Hello, World!\n");
}

#[tokio::test]
async fn test_wrong_output_fails_with_feedback() {
    if !compiler_available() {
        return;
    }
    let (base, _handle) = spawn_test_server(repo_catalog(), &Config::default()).await;
    let code = HELLO_SOLUTION.replace("Hello, World!", "Goodbye!");

    let (status, body) = submit(&base, 1, &code, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isValid"], false);
    assert_eq!(body["canProceed"], false);
    assert_eq!(
        body["feedback"],
        "None of the tests passed. Review your code and try again."
    );
    assert_eq!(body["testResults"][0]["actualOutput"], "Goodbye!\n");
}

#[tokio::test]
async fn test_compile_error_reports_diagnostics() {
    if !compiler_available() {
        return;
    }
    let (base, _handle) = spawn_test_server(repo_catalog(), &Config::default()).await;

    let (status, body) = submit(&base, 1, "int main(void) { return 0 }", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isValid"], false);
    assert_eq!(body["testResults"], serde_json::json!([]));
    assert!(body["feedback"].as_str().unwrap().contains("error"));
}

#[tokio::test]
async fn test_variables_lesson_output_matches() {
    if !compiler_available() {
        return;
    }
    let (base, _handle) = spawn_test_server(repo_catalog(), &Config::default()).await;

    let (_, body) = submit(&base, 2, VARIABLES_SOLUTION, None).await;

    assert_eq!(body["isValid"], true, "{body}");
}

#[tokio::test]
async fn test_stdin_lesson_runs_every_case() {
    if !compiler_available() {
        return;
    }
    let (base, _handle) = spawn_test_server(repo_catalog(), &Config::default()).await;

    let (_, body) = submit(&base, 3, SUM_SOLUTION, None).await;

    assert_eq!(body["isValid"], true, "{body}");
    assert_eq!(body["testResults"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_runaway_program_times_out() {
    if !compiler_available() {
        return;
    }
    let config = Config {
        run_timeout_secs: 1,
        ..Config::default()
    };
    let (base, _handle) = spawn_test_server(repo_catalog(), &config).await;

    let (status, body) = submit(&base, 1, "int main(void) { for (;;) {} }", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isValid"], false);
    assert_eq!(body["testResults"][0]["timedOut"], true);
}

#[tokio::test]
async fn test_missing_compiler_is_server_error() {
    let config = Config {
        compiler: "clesson-no-such-compiler".to_string(),
        ..Config::default()
    };
    let (base, _handle) = spawn_test_server(repo_catalog(), &config).await;

    let (status, body) = submit(&base, 1, HELLO_SOLUTION, None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}
