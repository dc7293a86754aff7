use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use super::dispatcher::NotificationDispatcher;
use super::domain::{DedupeKey, NewNotification, Notification};
use super::repository::{NotificationRepository, NotificationStoreError, PushTransport};

/// A periodic notification waiting for its once-per-day slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledNotification {
    /// What the notification is about, e.g. `birthday.42`.
    pub subject: String,
    pub notification: NewNotification,
}

impl ScheduledNotification {
    pub fn dedupe_key(&self, day: NaiveDate) -> DedupeKey {
        DedupeKey::derive(&self.subject, &self.notification.recipient, day)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledOutcome {
    Sent {
        notification: Notification,
        pushed: bool,
    },
    /// The dedupe key already exists; nothing was written.
    AlreadySent(DedupeKey),
    Failed(NotificationStoreError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub sent: usize,
    pub already_sent: usize,
    pub failed: usize,
    pub push_failures: usize,
}

/// Makes scheduled notifications idempotent per subject, recipient and calendar day.
pub struct DedupeGuard<'a, N, P> {
    dispatcher: &'a NotificationDispatcher<N, P>,
}

impl<'a, N, P> DedupeGuard<'a, N, P>
where
    N: NotificationRepository + 'static,
    P: PushTransport + 'static,
{
    pub fn new(dispatcher: &'a NotificationDispatcher<N, P>) -> Self {
        Self { dispatcher }
    }

    pub async fn deliver(&self, day: NaiveDate, candidate: ScheduledNotification) -> ScheduledOutcome {
        let key = candidate.dedupe_key(day);
        let draft = candidate.notification.with_dedupe_key(key.clone());
        let recipient = draft.recipient.clone();
        let payload = draft.payload();

        let notification = match self.dispatcher.record(draft) {
            Ok(notification) => notification,
            Err(NotificationStoreError::DuplicateDedupeKey(_)) => {
                debug!(dedupe_key = %key, "scheduled notification already sent");
                return ScheduledOutcome::AlreadySent(key);
            }
            Err(err) => {
                warn!(dedupe_key = %key, %recipient, error = %err, "failed to record scheduled notification");
                return ScheduledOutcome::Failed(err);
            }
        };

        let pushed = match self.dispatcher.push(&recipient, &payload).await {
            Ok(()) => true,
            Err(err) => {
                warn!(dedupe_key = %key, %recipient, error = %err, "scheduled push failed");
                false
            }
        };

        ScheduledOutcome::Sent {
            notification,
            pushed,
        }
    }

    /// Delivers every candidate; one failure never stops the rest of the batch.
    pub async fn run_batch(
        &self,
        day: NaiveDate,
        candidates: Vec<ScheduledNotification>,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        for candidate in candidates {
            match self.deliver(day, candidate).await {
                ScheduledOutcome::Sent { pushed, .. } => {
                    report.sent += 1;
                    if !pushed {
                        report.push_failures += 1;
                    }
                }
                ScheduledOutcome::AlreadySent(_) => report.already_sent += 1,
                ScheduledOutcome::Failed(_) => report.failed += 1,
            }
        }
        report
    }
}
