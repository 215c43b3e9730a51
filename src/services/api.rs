//! REST API routes.
//!
//! Thin JSON mapping over the team and pull request services. Every error is
//! returned as `{"error": {"code", "message"}}` with a status derived from the
//! `AppError` variant.

use crate::error::AppError;
use crate::models::{NewPullRequest, PullRequest, PullRequestShort, Team, User};
use crate::services::server::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Error handling ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

/// Wrapper to make AppError usable as an axum error response.
pub struct ApiErr(AppError);

impl ApiErr {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::AlreadyExists { resource, .. } if resource == "Team" => {
                (StatusCode::CONFLICT, "TEAM_EXISTS")
            }
            AppError::AlreadyExists { .. } => (StatusCode::CONFLICT, "PR_EXISTS"),
            AppError::AlreadyMerged { .. } => (StatusCode::CONFLICT, "PR_MERGED"),
            AppError::NotAssigned { .. } => (StatusCode::CONFLICT, "NOT_ASSIGNED"),
            AppError::NoEligibleCandidates { .. } => (StatusCode::CONFLICT, "NO_CANDIDATE"),
            AppError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Database { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            log::error!("[api] {}", self.0);
        } else {
            log::debug!("[api] {} {}", status.as_u16(), self.0);
        }
        (
            status,
            Json(ErrorEnvelope {
                error: ErrorBody {
                    code,
                    message: self.0.to_string(),
                },
            }),
        )
            .into_response()
    }
}

impl From<AppError> for ApiErr {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiErr {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::invalid_input(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiErr {
    fn from(rejection: QueryRejection) -> Self {
        Self(AppError::invalid_input(rejection.body_text()))
    }
}

type ApiResult<T> = Result<T, ApiErr>;

// ── Request types ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TeamQuery {
    team_name: String,
}

#[derive(Deserialize)]
struct UserQuery {
    user_id: String,
}

#[derive(Deserialize)]
struct SetIsActiveRequest {
    user_id: String,
    is_active: bool,
}

#[derive(Deserialize)]
struct CreatePullRequestRequest {
    pull_request_id: String,
    pull_request_name: String,
    author_id: String,
}

#[derive(Deserialize)]
struct MergeRequest {
    pull_request_id: String,
}

#[derive(Deserialize)]
struct ReassignRequest {
    pull_request_id: String,
    #[serde(alias = "old_reviewer_id")]
    old_user_id: String,
}

// ── Response types ───────────────────────────────────────────────────────────

/// Pull request as exposed over HTTP.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PullRequestResponse {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
    pub assigned_reviewers: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "mergedAt")]
    pub merged_at: Option<DateTime<Utc>>,
}

impl From<PullRequest> for PullRequestResponse {
    fn from(pr: PullRequest) -> Self {
        Self {
            created_at: DateTime::from_timestamp(pr.created_at, 0).unwrap_or_default(),
            merged_at: pr.merged_at.and_then(|ts| DateTime::from_timestamp(ts, 0)),
            pull_request_id: pr.id,
            pull_request_name: pr.name,
            author_id: pr.author_id,
            status: pr.status,
            assigned_reviewers: pr.reviewers,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PullRequestShortResponse {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
}

impl From<PullRequestShort> for PullRequestShortResponse {
    fn from(pr: PullRequestShort) -> Self {
        Self {
            pull_request_id: pr.id,
            pull_request_name: pr.name,
            author_id: pr.author_id,
            status: pr.status,
        }
    }
}

#[derive(Serialize)]
struct TeamEnvelope {
    team: Team,
}

#[derive(Serialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Serialize)]
struct ReviewQueueResponse {
    user_id: String,
    pull_requests: Vec<PullRequestShortResponse>,
}

#[derive(Serialize)]
struct PullRequestEnvelope {
    pr: PullRequestResponse,
}

#[derive(Serialize)]
struct ReassignResponse {
    pr: PullRequestResponse,
    replaced_by: Option<String>,
}

// ── Route builder ────────────────────────────────────────────────────────────

/// Team and user routes.
pub fn team_api_routes() -> Router<AppState> {
    Router::new()
        .route("/team/add", post(add_team))
        .route("/team/get", get(get_team))
        .route("/users/setIsActive", post(set_is_active))
        .route("/users/getReview", get(get_review))
}

/// Pull request lifecycle routes.
pub fn pull_request_api_routes() -> Router<AppState> {
    Router::new()
        .route("/pullRequest/create", post(create_pull_request))
        .route("/pullRequest/merge", post(merge_pull_request))
        .route("/pullRequest/reassign", post(reassign_reviewer))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /team/add: create a team and upsert its members.
async fn add_team(
    State(state): State<AppState>,
    body: Result<Json<Team>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(team) = body?;
    let team = state.teams.add_team(team).await?;
    Ok((StatusCode::CREATED, Json(TeamEnvelope { team })))
}

/// GET /team/get?team_name=X
async fn get_team(
    State(state): State<AppState>,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> ApiResult<Json<Team>> {
    let Query(query) = query?;
    Ok(Json(state.teams.get_team(&query.team_name).await?))
}

/// POST /users/setIsActive
async fn set_is_active(
    State(state): State<AppState>,
    body: Result<Json<SetIsActiveRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = body?;
    let user = state.teams.set_is_active(&req.user_id, req.is_active).await?;
    Ok(Json(UserEnvelope { user }))
}

/// GET /users/getReview?user_id=X: pull requests the user reviews.
async fn get_review(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let pull_requests = state.teams.review_queue(&query.user_id).await?;
    Ok(Json(ReviewQueueResponse {
        user_id: query.user_id,
        pull_requests: pull_requests.into_iter().map(Into::into).collect(),
    }))
}

/// POST /pullRequest/create: open a pull request and assign reviewers.
async fn create_pull_request(
    State(state): State<AppState>,
    body: Result<Json<CreatePullRequestRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = body?;
    let pr = state
        .pull_requests
        .create(NewPullRequest {
            id: req.pull_request_id,
            name: req.pull_request_name,
            author_id: req.author_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(PullRequestEnvelope { pr: pr.into() })))
}

/// POST /pullRequest/merge: idempotent.
async fn merge_pull_request(
    State(state): State<AppState>,
    body: Result<Json<MergeRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = body?;
    let pr = state.pull_requests.merge(&req.pull_request_id).await?;
    Ok(Json(PullRequestEnvelope { pr: pr.into() }))
}

/// POST /pullRequest/reassign: swap one reviewer for a fresh teammate.
async fn reassign_reviewer(
    State(state): State<AppState>,
    body: Result<Json<ReassignRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = body?;
    let outcome = state
        .pull_requests
        .reassign(&req.pull_request_id, &req.old_user_id)
        .await?;
    Ok(Json(ReassignResponse {
        pr: outcome.pull_request.into(),
        replaced_by: outcome.replaced_by,
    }))
}
