use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ActivityId, ApproverId, ApproverStatus, CreateActivityRequest};
use super::matcher::MatchInput;
use super::repository::ApprovalStore;
use super::service::{ActivityApprovalService, ApprovalError};
use crate::workflows::notifications::sink::NotificationSink;

#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdate {
    pub(crate) status: ApproverStatus,
}

/// Router builder exposing activity creation, rule matching and approver decisions.
pub fn approval_router<S, K>(service: Arc<ActivityApprovalService<S, K>>) -> Router
where
    S: ApprovalStore + 'static,
    K: NotificationSink + 'static,
{
    Router::new()
        .route("/api/v1/activities", post(create_handler::<S, K>))
        .route(
            "/api/v1/activities/:activity_id",
            get(activity_handler::<S, K>),
        )
        .route("/api/v1/approvals/match", post(match_handler::<S, K>))
        .route(
            "/api/v1/approvers/:approver_id",
            patch(status_handler::<S, K>),
        )
        .with_state(service)
}

pub(crate) fn error_response(error: ApprovalError) -> Response {
    let status = match &error {
        ApprovalError::NotFound(_) => StatusCode::NOT_FOUND,
        ApprovalError::DuplicateApprover { .. } => StatusCode::CONFLICT,
        ApprovalError::InvalidTransition => StatusCode::UNPROCESSABLE_ENTITY,
        ApprovalError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn create_handler<S, K>(
    State(service): State<Arc<ActivityApprovalService<S, K>>>,
    axum::Json(request): axum::Json<CreateActivityRequest>,
) -> Response
where
    S: ApprovalStore + 'static,
    K: NotificationSink + 'static,
{
    match service.create_activity(request) {
        Ok(created) => (StatusCode::CREATED, axum::Json(created)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn activity_handler<S, K>(
    State(service): State<Arc<ActivityApprovalService<S, K>>>,
    Path(activity_id): Path<i64>,
) -> Response
where
    S: ApprovalStore + 'static,
    K: NotificationSink + 'static,
{
    match service.activity(ActivityId(activity_id)) {
        Ok(details) => (StatusCode::OK, axum::Json(details)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn match_handler<S, K>(
    State(service): State<Arc<ActivityApprovalService<S, K>>>,
    axum::Json(input): axum::Json<MatchInput>,
) -> Response
where
    S: ApprovalStore + 'static,
    K: NotificationSink + 'static,
{
    match service.match_approvers(&input) {
        Ok(matched) => (StatusCode::OK, axum::Json(matched)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<S, K>(
    State(service): State<Arc<ActivityApprovalService<S, K>>>,
    Path(approver_id): Path<i64>,
    axum::Json(update): axum::Json<StatusUpdate>,
) -> Response
where
    S: ApprovalStore + 'static,
    K: NotificationSink + 'static,
{
    match service.update_approver_status(ApproverId(approver_id), update.status) {
        Ok(approver) => (StatusCode::OK, axum::Json(approver)).into_response(),
        Err(error) => error_response(error),
    }
}
