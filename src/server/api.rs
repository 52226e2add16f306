//! REST API route handlers.

use crate::models::{AnalysisResult, Issue, PlanResult, PlannerError};
use crate::server::AppState;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Handler error rendered as `{"error": "..."}` with a matching status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<PlannerError> for ApiError {
    fn from(err: PlannerError) -> Self {
        let status = match err {
            PlannerError::IssueNotFound(_) => StatusCode::NOT_FOUND,
            PlannerError::InvalidInput(_) | PlannerError::ParseError(_) => StatusCode::BAD_REQUEST,
            PlannerError::IssueExists(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// Malformed bodies keep axum's status (400, 415, 422) but use our error shape.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(error = %self.message, "Request failed");
        } else {
            warn!(status = self.status.as_u16(), error = %self.message, "Request rejected");
        }
        (self.status, Json(json!({"error": self.message}))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

// ---------------------------------------------------------------------------
// Issue management
// ---------------------------------------------------------------------------

/// `POST /events`: store a new issue.
pub async fn create_issue(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<&'static str>> {
    let Json(body) = body?;
    let issue = Issue::from_json(body)?;
    info!(issue_id = %issue.id, "Received new issue");
    state.store.create(issue).await?;
    Ok(Json("OK"))
}

/// `GET /issues`
pub async fn list_issues(State(state): State<Arc<AppState>>) -> Json<Vec<Issue>> {
    Json(state.store.list().await)
}

/// `GET /issues/{id}`
pub async fn get_issue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Issue>> {
    Ok(Json(state.store.get(&id).await?))
}

/// `PUT /issues/{id}`: merge the body over the stored issue.
pub async fn update_issue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    patch: std::result::Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Issue>> {
    let Json(patch) = patch?;
    Ok(Json(state.store.update(&id, patch).await?))
}

/// `DELETE /issues/{id}`
pub async fn delete_issue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.store.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// LLM operations
// ---------------------------------------------------------------------------

/// `POST /analyze/{id}`: analyze and merge the result into the issue.
pub async fn analyze_issue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<AnalysisResult>> {
    info!(issue_id = %id, "Analyzing issue");
    let issue = state.store.get(&id).await?;

    let analysis = state.llm.analyze_issue(&issue).await?;
    debug!(issue_id = %id, analysis = ?analysis, "Received analysis from LLM");

    state.store.apply_analysis(&id, &analysis).await?;
    info!(issue_id = %id, "Analysis completed");
    Ok(Json(analysis))
}

/// `POST /plan/{id}`: generate a plan and store it on the issue.
pub async fn plan_issue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<PlanResult>> {
    info!(issue_id = %id, "Planning issue");
    let issue = state.store.get(&id).await?;

    let plan = state.llm.plan_issue(&issue).await?;
    debug!(issue_id = %id, "Received plan from LLM");

    state.store.apply_plan(&id, &plan).await?;
    info!(issue_id = %id, "Planning completed");
    Ok(Json(plan))
}
