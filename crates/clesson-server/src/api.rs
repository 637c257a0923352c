//! HTTP API for the clesson server.
//!
//! # Endpoints
//!
//! - `GET /api/health` - Liveness and lesson count
//! - `GET /api/lessons` - List lesson summaries
//! - `GET /api/lessons/:id` - Fetch one lesson
//! - `POST /api/lessons/:id/validate` - Grade a submission
//! - `GET /api/progress/:user_id` - Fetch a learner's progress
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use clesson_server::{create_router, AppState, Catalog, Config, Lesson};
//!
//! # async fn example() {
//! let catalog = Catalog::from_lessons(vec![Lesson::new(1, "Hello")]).unwrap();
//! let state = AppState::new(Arc::new(catalog), &Config::default());
//!
//! let router = create_router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:50052").await.unwrap();
//! axum::serve(listener, router).await.unwrap();
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::{
    Catalog, Config, Grader, Lesson, LessonId, LessonSummary, PrerequisiteGate, ProgressReport,
    ProgressStore, ServerError, TestVerdict, ValidationOutcome,
};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for the validate endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    /// C source code to grade.
    pub code: String,
    /// Learner to gate and record progress for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Response body for the validate endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    /// Whether every test passed.
    pub is_valid: bool,
    /// Per-test verdicts; empty on a compile error.
    pub test_results: Vec<TestVerdict>,
    /// Summary or compiler diagnostics.
    pub feedback: String,
    /// Whether the learner may move on.
    pub can_proceed: bool,
}

impl From<ValidationOutcome> for ValidateResponse {
    fn from(outcome: ValidationOutcome) -> Self {
        Self {
            is_valid: outcome.all_tests_passed,
            test_results: outcome.verdicts,
            feedback: outcome.feedback,
            can_proceed: outcome.can_proceed,
        }
    }
}

/// Response body for the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: String,
    /// Number of lessons in the catalog.
    pub lessons: usize,
}

/// Error response body returned on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the HTTP server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Loaded lessons.
    pub catalog: Arc<Catalog>,
    /// Prerequisite gate over the shared progress store.
    pub gate: PrerequisiteGate,
    /// Submission grader.
    pub grader: Grader,
}

impl AppState {
    /// Creates state with an empty progress store.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, config: &Config) -> Self {
        Self::with_store(catalog, config, Arc::new(ProgressStore::new()))
    }

    /// Creates state over an existing progress store.
    #[must_use]
    pub fn with_store(catalog: Arc<Catalog>, config: &Config, store: Arc<ProgressStore>) -> Self {
        Self {
            gate: PrerequisiteGate::new(Arc::clone(&catalog), store),
            grader: Grader::from_config(Arc::clone(&catalog), config),
            catalog,
        }
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Internal error type for API handlers.
#[derive(Debug)]
struct ApiError(ServerError);

impl From<ServerError> for ApiError {
    fn from(err: ServerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ServerError::LessonNotFound { .. } => StatusCode::NOT_FOUND,
            ServerError::PrerequisitesNotMet { .. } => StatusCode::FORBIDDEN,
            ServerError::GraderUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }

        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all API endpoints.
///
/// Routes live under `/api`, with CORS and request tracing layered on top.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(handle_health))
        .route("/lessons", get(handle_list_lessons))
        .route("/lessons/:id", get(handle_get_lesson))
        .route("/lessons/:id/validate", post(handle_validate))
        .route("/progress/:user_id", get(handle_progress));

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// Handler for `GET /api/health`.
async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        lessons: state.catalog.len(),
    })
}

/// Handler for `GET /api/lessons`.
async fn handle_list_lessons(State(state): State<Arc<AppState>>) -> Json<Vec<LessonSummary>> {
    Json(state.catalog.summaries())
}

/// Handler for `GET /api/lessons/:id`.
async fn handle_get_lesson(
    State(state): State<Arc<AppState>>,
    Path(id): Path<LessonId>,
) -> Result<Json<Lesson>, ApiError> {
    let lesson = state.catalog.get(id)?;
    Ok(Json(lesson.clone()))
}

/// Handler for `POST /api/lessons/:id/validate`.
///
/// With a `userId`, the attempt is gated on prerequisites and a passing
/// submission is recorded as completed.
async fn handle_validate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<LessonId>,
    Json(request): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>, ApiError> {
    info!(
        lesson_id = id,
        user_id = request.user_id.as_deref().unwrap_or("-"),
        code_len = request.code.len(),
        "Received submission"
    );

    if let Some(user_id) = &request.user_id {
        if let Err(e) = state.gate.check_attempt(user_id, id).await {
            warn!(lesson_id = id, user_id = %user_id, error = %e, "Submission rejected");
            return Err(e.into());
        }
    }

    let outcome = state.grader.validate(id, &request.code).await?;

    if let (Some(user_id), true) = (&request.user_id, outcome.can_proceed) {
        state.gate.record_success(user_id, id).await;
    }

    Ok(Json(outcome.into()))
}

/// Handler for `GET /api/progress/:user_id`.
async fn handle_progress(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Json<ProgressReport> {
    Json(state.gate.report(&user_id).await)
}
