//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clesson_server::{create_router, AppState, Catalog, Config, DirectoryLessonSource};

/// Helper to find an available port for testing.
pub fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

/// Path to the lessons shipped with the repository.
pub fn repo_lessons_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../lessons")
}

/// Returns `true` if `gcc` can be started.
pub fn compiler_available() -> bool {
    std::process::Command::new("gcc")
        .arg("--version")
        .output()
        .is_ok()
}

/// Loads the repository lessons.
pub fn repo_catalog() -> Catalog {
    Catalog::load(&DirectoryLessonSource::new(repo_lessons_dir())).expect("Failed to load lessons")
}

/// Spawns a server over `catalog` and returns its base URL.
pub async fn spawn_test_server(catalog: Catalog, config: &Config) -> (String, tokio::task::JoinHandle<()>) {
    let port = find_available_port();
    let addr = format!("127.0.0.1:{port}");

    let router = create_router(AppState::new(Arc::new(catalog), config));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://{addr}"), handle)
}

/// Posts a submission and returns the status and JSON body.
pub async fn submit(
    base: &str,
    lesson_id: u32,
    code: &str,
    user_id: Option<&str>,
) -> (reqwest::StatusCode, serde_json::Value) {
    let mut body = serde_json::json!({ "code": code });
    if let Some(user_id) = user_id {
        body["userId"] = serde_json::Value::from(user_id);
    }

    let response = reqwest::Client::new()
        .post(format!("{base}/api/lessons/{lesson_id}/validate"))
        .json(&body)
        .send()
        .await
        .expect("Request failed");
    let status = response.status();
    let json = response.json().await.expect("Invalid JSON body");
    (status, json)
}

/// Fetches a learner's progress as JSON.
pub async fn progress(base: &str, user_id: &str) -> serde_json::Value {
    reqwest::get(format!("{base}/api/progress/{user_id}"))
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid JSON body")
}

pub const HELLO_SOLUTION: &str = r#"#include <stdio.h>

int main(void) {
    printf("Hello, World!\n");
    return 0;
}
"#;

pub const VARIABLES_SOLUTION: &str = r#"#include <stdio.h>

int main(void) {
    int age = 25;
    float height = 1.75f;
    float weight = 70.5f;

    printf("Age: %d years\n", age);
    printf("Height: %.2f meters\n", height);
    printf("Weight: %.1f kg\n", weight);
    printf("BMI: %.1f\n", weight / (height * height));
    return 0;
}
"#;

pub const SUM_SOLUTION: &str = r#"#include <stdio.h>

int main(void) {
    int a, b;
    if (scanf("%d %d", &a, &b) != 2) {
        return 1;
    }
    printf("%d\n", a + b);
    return 0;
}
"#;
