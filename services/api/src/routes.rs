use crate::infra::{deserialize_optional_date, AppState, Dispatcher, Platform};
use activity_approvals::error::AppError;
use activity_approvals::workflows::approvals::{approval_router, InMemoryApprovalStore};
use activity_approvals::workflows::notifications::{
    notification_router, BatchReport, BirthdayReminderJob,
};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Handles needed by the reminder trigger.
#[derive(Clone)]
pub(crate) struct ReminderState {
    pub(crate) directory: Arc<InMemoryApprovalStore>,
    pub(crate) dispatcher: Arc<Dispatcher>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BirthdayRunRequest {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) day: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BirthdayRunResponse {
    pub(crate) day: NaiveDate,
    #[serde(flatten)]
    pub(crate) report: BatchReport,
}

pub(crate) fn with_platform_routes(platform: &Platform) -> axum::Router {
    approval_router(platform.service.clone())
        .merge(notification_router(platform.inbox.clone()))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/reminders/birthdays",
            axum::routing::post(birthday_reminder_endpoint),
        )
        .layer(Extension(ReminderState {
            directory: platform.directory.clone(),
            dispatcher: platform.dispatcher.clone(),
        }))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Runs the birthday job for `day` (today when omitted). Safe to call repeatedly.
pub(crate) async fn birthday_reminder_endpoint(
    Extension(state): Extension<ReminderState>,
    Json(payload): Json<BirthdayRunRequest>,
) -> Result<Json<BirthdayRunResponse>, AppError> {
    let day = payload.day.unwrap_or_else(|| Local::now().date_naive());
    let report = BirthdayReminderJob::new(state.directory.as_ref(), state.dispatcher.as_ref())
        .run(day)
        .await?;

    Ok(Json(BirthdayRunResponse { day, report }))
}
