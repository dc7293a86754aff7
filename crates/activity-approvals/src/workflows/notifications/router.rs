use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::NotificationId;
use super::inbox::NotificationInbox;
use super::repository::{NotificationRepository, NotificationStoreError};

/// `recipients` is a comma separated list of interests.
#[derive(Debug, Deserialize)]
pub(crate) struct InboxQuery {
    pub(crate) recipients: String,
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

impl InboxQuery {
    fn recipients(&self) -> Vec<String> {
        self.recipients
            .split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect()
    }
}

pub fn notification_router<N>(inbox: Arc<NotificationInbox<N>>) -> Router
where
    N: NotificationRepository + 'static,
{
    Router::new()
        .route("/api/v1/notifications", get(list_handler::<N>))
        .route(
            "/api/v1/notifications/:notification_id/read",
            post(mark_read_handler::<N>),
        )
        .with_state(inbox)
}

fn error_response(error: NotificationStoreError) -> Response {
    let status = match error {
        NotificationStoreError::NotFound => StatusCode::NOT_FOUND,
        NotificationStoreError::DuplicateDedupeKey(_) => StatusCode::CONFLICT,
        NotificationStoreError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, axum::Json(json!({ "error": error.to_string() }))).into_response()
}

pub(crate) async fn list_handler<N>(
    State(inbox): State<Arc<NotificationInbox<N>>>,
    Query(query): Query<InboxQuery>,
) -> Response
where
    N: NotificationRepository + 'static,
{
    match inbox.list(&query.recipients(), query.limit) {
        Ok(notifications) => (StatusCode::OK, axum::Json(notifications)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn mark_read_handler<N>(
    State(inbox): State<Arc<NotificationInbox<N>>>,
    Path(notification_id): Path<i64>,
) -> Response
where
    N: NotificationRepository + 'static,
{
    match inbox.mark_read(NotificationId(notification_id)) {
        Ok(notification) => (StatusCode::OK, axum::Json(notification)).into_response(),
        Err(error) => error_response(error),
    }
}
