use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::approvals::{ApprovalError, RepositoryError};
use crate::workflows::notifications::NotificationStoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Approval(ApprovalError),
    Storage(RepositoryError),
    Notification(NotificationStoreError),
    InvalidInput(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Approval(err) => write!(f, "approval error: {}", err),
            AppError::Storage(err) => write!(f, "storage error: {}", err),
            AppError::Notification(err) => write!(f, "notification error: {}", err),
            AppError::InvalidInput(message) => write!(f, "invalid input: {}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Approval(err) => Some(err),
            AppError::Storage(err) => Some(err),
            AppError::Notification(err) => Some(err),
            AppError::InvalidInput(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Approval(ApprovalError::NotFound(_))
            | AppError::Storage(RepositoryError::NotFound)
            | AppError::Notification(NotificationStoreError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Approval(ApprovalError::DuplicateApprover { .. }) => StatusCode::CONFLICT,
            AppError::Approval(ApprovalError::InvalidTransition) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Approval(ApprovalError::Repository(_))
            | AppError::Storage(_)
            | AppError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ApprovalError> for AppError {
    fn from(value: ApprovalError) -> Self {
        Self::Approval(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Storage(value)
    }
}

impl From<NotificationStoreError> for AppError {
    fn from(value: NotificationStoreError) -> Self {
        Self::Notification(value)
    }
}
