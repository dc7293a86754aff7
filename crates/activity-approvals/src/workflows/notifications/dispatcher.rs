use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use super::domain::{NewNotification, Notification, NotificationKind, PushPayload};
use super::interest::{membership_interest, Interest};
use super::repository::{
    NotificationRepository, NotificationStoreError, PushError, PushTransport,
};
use super::sink::{ActivityCreatedFanout, FanoutTask, StatusChangeFanout};
use crate::workflows::approvals::domain::{Activity, ApproverStatus, MembershipId};

/// Failure of one recipient inside a fan-out. Never escalated past the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryFailure {
    #[error("could not record notification for {recipient}: {source}")]
    Record {
        recipient: String,
        source: NotificationStoreError,
    },
    #[error("push to {recipient} failed: {source}")]
    Push { recipient: String, source: PushError },
}

/// Tally of a single fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanoutReport {
    pub recorded: Vec<Notification>,
    pub pushed: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl FanoutReport {
    pub fn recipients(&self) -> Vec<&str> {
        self.recorded
            .iter()
            .map(|notification| notification.recipient.as_str())
            .collect()
    }
}

/// Writes notification rows and attempts push delivery for approval events.
pub struct NotificationDispatcher<N, P> {
    notifications: Arc<N>,
    push: Arc<P>,
    push_timeout: Duration,
}

impl<N, P> NotificationDispatcher<N, P>
where
    N: NotificationRepository + 'static,
    P: PushTransport + 'static,
{
    pub fn new(notifications: Arc<N>, push: Arc<P>, push_timeout: Duration) -> Self {
        Self {
            notifications,
            push,
            push_timeout,
        }
    }

    pub fn notifications(&self) -> &Arc<N> {
        &self.notifications
    }

    pub fn record(&self, draft: NewNotification) -> Result<Notification, NotificationStoreError> {
        self.notifications.insert(draft)
    }

    /// One push attempt bounded by the configured timeout. No retries.
    pub async fn push(&self, interest: &str, payload: &PushPayload) -> Result<(), PushError> {
        match tokio::time::timeout(self.push_timeout, self.push.push(interest, payload)).await {
            Ok(result) => result,
            Err(_) => Err(PushError::Timeout(self.push_timeout)),
        }
    }

    pub async fn dispatch(&self, task: &FanoutTask) -> FanoutReport {
        match task {
            FanoutTask::ActivityCreated(fanout) => self.activity_created(fanout).await,
            FanoutTask::StatusChanged(change) => self.approval_status_changed(change).await,
        }
    }

    /// One ACTIVITY_CREATED row for the activity's group plus one APPROVAL_REQUIRED row
    /// per approver.
    pub async fn activity_created(&self, fanout: &ActivityCreatedFanout) -> FanoutReport {
        let activity = &fanout.activity;
        let mut report = FanoutReport::default();

        let group = Interest::bipra(activity.organization_id, activity.bipra).to_string();
        let announcement = NewNotification::new(
            NotificationKind::ActivityCreated,
            group,
            format!("New {}: {}", activity.kind.label().to_lowercase(), activity.title),
            format!("{} {}", activity.kind.label(), schedule_phrase(activity.date)),
        )
        .for_activity(activity.id);
        self.deliver(&mut report, activity, announcement).await;

        for approver in &fanout.approvers {
            let request = NewNotification::new(
                NotificationKind::ApprovalRequired,
                membership_interest(approver.membership_id),
                format!("Approval needed: {}", activity.title),
                format!(
                    "{} {} is waiting for your approval",
                    activity.kind.label(),
                    schedule_phrase(activity.date)
                ),
            )
            .for_activity(activity.id);
            self.deliver(&mut report, activity, request).await;
        }

        report
    }

    /// Notifies the supervisor and every other still-unconfirmed approver, once each.
    pub async fn approval_status_changed(&self, change: &StatusChangeFanout) -> FanoutReport {
        let activity = &change.activity;
        let mut report = FanoutReport::default();

        let (kind, action) = match change.approver.status {
            ApproverStatus::Approved => (NotificationKind::ApprovalConfirmed, "approved"),
            ApproverStatus::Rejected => (NotificationKind::ApprovalRejected, "rejected"),
            ApproverStatus::Unconfirmed => {
                warn!(
                    activity_id = %activity.id,
                    approver_id = %change.approver.id,
                    "status fan-out requested for an unconfirmed approver; skipping"
                );
                return report;
            }
        };

        for membership in status_change_recipients(change) {
            let notification = NewNotification::new(
                kind,
                membership_interest(membership),
                format!("Activity {action}: {}", activity.title),
                format!("{} {action} \"{}\"", change.approver_name, activity.title),
            )
            .for_activity(activity.id);
            self.deliver(&mut report, activity, notification).await;
        }

        report
    }

    async fn deliver(&self, report: &mut FanoutReport, activity: &Activity, draft: NewNotification) {
        let recipient = draft.recipient.clone();
        let payload = draft.payload();

        let stored = match self.record(draft) {
            Ok(stored) => stored,
            Err(source) => {
                warn!(activity_id = %activity.id, %recipient, error = %source, "failed to record notification");
                report.failures.push(DeliveryFailure::Record { recipient, source });
                return;
            }
        };
        report.recorded.push(stored);

        match self.push(&recipient, &payload).await {
            Ok(()) => {
                report.pushed += 1;
                debug!(activity_id = %activity.id, %recipient, "push delivered");
            }
            Err(source) => {
                warn!(activity_id = %activity.id, %recipient, error = %source, "push delivery failed");
                report.failures.push(DeliveryFailure::Push { recipient, source });
            }
        }
    }
}

/// `{supervisor} ∪ {other unconfirmed approvers}`, minus the member who just acted.
pub fn status_change_recipients(change: &StatusChangeFanout) -> BTreeSet<MembershipId> {
    let mut recipients: BTreeSet<MembershipId> = change
        .approvers
        .iter()
        .filter(|approver| approver.id != change.approver.id)
        .filter(|approver| approver.status == ApproverStatus::Unconfirmed)
        .map(|approver| approver.membership_id)
        .collect();
    recipients.insert(change.activity.supervisor_id);
    recipients.remove(&change.approver.membership_id);
    recipients
}

fn schedule_phrase(date: Option<NaiveDateTime>) -> String {
    match date {
        Some(date) => format!("scheduled for {}", date.format("%A, %d %B %Y %H:%M")),
        None => "with no date set".to_string(),
    }
}
