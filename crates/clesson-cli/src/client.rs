//! HTTP client for the clesson server API.

use clesson_server::{
    ErrorResponse, HealthResponse, Lesson, LessonId, ProgressReport, ValidateRequest,
    ValidateResponse,
};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Client for one server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Creates a client for the server at `base_url`, e.g. `http://127.0.0.1:50052`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Returns the server base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.base_url)
    }

    /// Checks that the server is up.
    pub async fn health(&self) -> anyhow::Result<HealthResponse> {
        self.get("/health").await
    }

    /// Fetches a lesson.
    pub async fn lesson(&self, id: LessonId) -> anyhow::Result<Lesson> {
        self.get(&format!("/lessons/{id}")).await
    }

    /// Submits `code` for grading against lesson `id`.
    pub async fn validate(
        &self,
        id: LessonId,
        code: &str,
        user_id: Option<&str>,
    ) -> anyhow::Result<ValidateResponse> {
        let request = ValidateRequest {
            code: code.to_string(),
            user_id: user_id.map(ToString::to_string),
        };
        let url = self.url(&format!("/lessons/{id}/validate"));
        debug!(%url, code_len = code.len(), "Submitting code");
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.connection_error(&e))?;
        Self::decode(response).await
    }

    /// Fetches a learner's progress.
    pub async fn progress(&self, user_id: &str) -> anyhow::Result<ProgressReport> {
        self.get(&format!("/progress/{user_id}")).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.connection_error(&e))?;
        Self::decode(response).await
    }

    fn connection_error(&self, err: &reqwest::Error) -> anyhow::Error {
        anyhow::anyhow!(
            "Failed to reach server at {}: {err}\n\nSuggestion: Start it with 'clesson-server' or point --server at a running instance",
            self.base_url
        )
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> anyhow::Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };

        match status {
            StatusCode::FORBIDDEN => anyhow::bail!(
                "{message}\n\nSuggestion: Complete the prerequisite lessons first (see 'clesson progress')"
            ),
            _ => anyhow::bail!("Server returned {status}: {message}"),
        }
    }
}
