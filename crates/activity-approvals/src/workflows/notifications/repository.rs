use std::time::Duration;

use async_trait::async_trait;

use super::domain::{NewNotification, Notification, NotificationId, PushPayload};

/// Failures raised by the notification store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationStoreError {
    #[error("dedupe key '{0}' already recorded")]
    DuplicateDedupeKey(String),
    #[error("notification not found")]
    NotFound,
    #[error("notification store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence for notification rows.
pub trait NotificationRepository: Send + Sync {
    /// Inserts a row with `is_read = false`. A repeated `dedupe_key` fails with
    /// `DuplicateDedupeKey` and leaves the existing row untouched.
    fn insert(&self, notification: NewNotification) -> Result<Notification, NotificationStoreError>;
    fn fetch(&self, id: NotificationId) -> Result<Option<Notification>, NotificationStoreError>;
    /// Newest first.
    fn for_recipients(
        &self,
        recipients: &[String],
        limit: usize,
    ) -> Result<Vec<Notification>, NotificationStoreError>;
    /// Flips `is_read` to true. Already-read rows are returned unchanged.
    fn mark_read(&self, id: NotificationId) -> Result<Notification, NotificationStoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PushError {
    #[error("push backend rejected the message: {0}")]
    Rejected(String),
    #[error("push transport failure: {0}")]
    Transport(String),
    #[error("push delivery timed out after {0:?}")]
    Timeout(Duration),
}

/// Outbound push backend (e.g. a Beams/FCM/APNs adapter).
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn push(&self, interest: &str, payload: &PushPayload) -> Result<(), PushError>;
}
