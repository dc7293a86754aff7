use std::sync::Arc;

use super::domain::{Notification, NotificationId};
use super::repository::{NotificationRepository, NotificationStoreError};

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 200;

/// Read side of the notification table: listing per interest and read acknowledgement.
pub struct NotificationInbox<N> {
    notifications: Arc<N>,
}

impl<N> NotificationInbox<N>
where
    N: NotificationRepository + 'static,
{
    pub fn new(notifications: Arc<N>) -> Self {
        Self { notifications }
    }

    pub fn list(
        &self,
        recipients: &[String],
        limit: Option<usize>,
    ) -> Result<Vec<Notification>, NotificationStoreError> {
        if recipients.is_empty() {
            return Ok(Vec::new());
        }
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        self.notifications.for_recipients(recipients, limit)
    }

    pub fn get(&self, id: NotificationId) -> Result<Notification, NotificationStoreError> {
        self.notifications
            .fetch(id)?
            .ok_or(NotificationStoreError::NotFound)
    }

    pub fn mark_read(&self, id: NotificationId) -> Result<Notification, NotificationStoreError> {
        self.notifications.mark_read(id)
    }
}
