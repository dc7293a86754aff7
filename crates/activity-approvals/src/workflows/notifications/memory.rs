use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::domain::{NewNotification, Notification, NotificationId, PushPayload};
use super::repository::{NotificationRepository, NotificationStoreError, PushError, PushTransport};

#[derive(Default)]
struct NotificationState {
    rows: BTreeMap<NotificationId, Notification>,
    dedupe_keys: BTreeSet<String>,
    next_id: i64,
}

/// Process-local notification table with a unique index on `dedupe_key`.
#[derive(Default, Clone)]
pub struct InMemoryNotificationStore {
    state: Arc<Mutex<NotificationState>>,
}

impl InMemoryNotificationStore {
    fn state(&self) -> MutexGuard<'_, NotificationState> {
        self.state.lock().expect("notification store mutex poisoned")
    }

    pub fn all(&self) -> Vec<Notification> {
        self.state().rows.values().cloned().collect()
    }
}

impl NotificationRepository for InMemoryNotificationStore {
    fn insert(&self, notification: NewNotification) -> Result<Notification, NotificationStoreError> {
        let mut state = self.state();
        if let Some(key) = &notification.dedupe_key {
            if !state.dedupe_keys.insert(key.as_str().to_string()) {
                return Err(NotificationStoreError::DuplicateDedupeKey(
                    key.as_str().to_string(),
                ));
            }
        }

        state.next_id += 1;
        let now = Utc::now();
        let row = Notification {
            id: NotificationId(state.next_id),
            title: notification.title,
            body: notification.body,
            kind: notification.kind,
            recipient: notification.recipient,
            is_read: false,
            activity_id: notification.activity_id,
            dedupe_key: notification.dedupe_key,
            created_at: now,
            updated_at: now,
        };
        state.rows.insert(row.id, row.clone());
        Ok(row)
    }

    fn fetch(&self, id: NotificationId) -> Result<Option<Notification>, NotificationStoreError> {
        Ok(self.state().rows.get(&id).cloned())
    }

    fn for_recipients(
        &self,
        recipients: &[String],
        limit: usize,
    ) -> Result<Vec<Notification>, NotificationStoreError> {
        // ids are monotonic, so reverse id order is newest first
        Ok(self
            .state()
            .rows
            .values()
            .rev()
            .filter(|row| recipients.iter().any(|recipient| *recipient == row.recipient))
            .take(limit)
            .cloned()
            .collect())
    }

    fn mark_read(&self, id: NotificationId) -> Result<Notification, NotificationStoreError> {
        let mut state = self.state();
        let row = state
            .rows
            .get_mut(&id)
            .ok_or(NotificationStoreError::NotFound)?;
        if !row.is_read {
            row.is_read = true;
            row.updated_at = Utc::now();
        }
        Ok(row.clone())
    }
}

/// Push transport that records deliveries and can be told to fail specific interests.
#[derive(Default, Clone)]
pub struct RecordingPushTransport {
    delivered: Arc<Mutex<Vec<(String, PushPayload)>>>,
    failing: Arc<Mutex<BTreeSet<String>>>,
}

impl RecordingPushTransport {
    pub fn fail_for(&self, interest: impl Into<String>) {
        self.failing
            .lock()
            .expect("push mutex poisoned")
            .insert(interest.into());
    }

    pub fn delivered(&self) -> Vec<(String, PushPayload)> {
        self.delivered.lock().expect("push mutex poisoned").clone()
    }

    pub fn interests(&self) -> Vec<String> {
        self.delivered()
            .into_iter()
            .map(|(interest, _)| interest)
            .collect()
    }
}

#[async_trait]
impl PushTransport for RecordingPushTransport {
    async fn push(&self, interest: &str, payload: &PushPayload) -> Result<(), PushError> {
        if self
            .failing
            .lock()
            .expect("push mutex poisoned")
            .contains(interest)
        {
            return Err(PushError::Rejected(format!("interest {interest} is blocked")));
        }

        self.delivered
            .lock()
            .expect("push mutex poisoned")
            .push((interest.to_string(), payload.clone()));
        Ok(())
    }
}
