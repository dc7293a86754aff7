use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::approvals::domain::{
    Activity, ActivityId, ActivityKind, Approver, ApproverId, ApproverStatus, Bipra,
    MembershipId, OrganizationId,
};
use crate::workflows::notifications::dispatcher::NotificationDispatcher;
use crate::workflows::notifications::domain::{
    NewNotification, Notification, NotificationId, PushPayload,
};
use crate::workflows::notifications::memory::{InMemoryNotificationStore, RecordingPushTransport};
use crate::workflows::notifications::repository::{
    NotificationRepository, NotificationStoreError, PushError, PushTransport,
};
use crate::workflows::notifications::sink::{ActivityCreatedFanout, StatusChangeFanout};

pub(super) const ORG: OrganizationId = OrganizationId(5);
pub(super) const SUPERVISOR: MembershipId = MembershipId(99);
pub(super) const PUSH_TIMEOUT: Duration = Duration::from_millis(200);

pub(super) type TestDispatcher = NotificationDispatcher<InMemoryNotificationStore, RecordingPushTransport>;

pub(super) fn dispatcher() -> (
    TestDispatcher,
    InMemoryNotificationStore,
    RecordingPushTransport,
) {
    let store = InMemoryNotificationStore::default();
    let push = RecordingPushTransport::default();
    let dispatcher = NotificationDispatcher::new(
        Arc::new(store.clone()),
        Arc::new(push.clone()),
        PUSH_TIMEOUT,
    );
    (dispatcher, store, push)
}

pub(super) fn worship(date: Option<NaiveDate>) -> Activity {
    Activity {
        id: ActivityId(1_001),
        organization_id: ORG,
        supervisor_id: SUPERVISOR,
        title: "Sunday Worship".to_string(),
        kind: ActivityKind::Service,
        bipra: Bipra::Pkb,
        date: date.and_then(|day| day.and_hms_opt(9, 0, 0)),
        note: None,
    }
}

pub(super) fn sunday() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2025, 10, 12)
}

pub(super) fn approver(id: i64, membership: i64, status: ApproverStatus) -> Approver {
    Approver {
        id: ApproverId(id),
        activity_id: ActivityId(1_001),
        membership_id: MembershipId(membership),
        status,
    }
}

pub(super) fn created(approvers: Vec<Approver>) -> ActivityCreatedFanout {
    ActivityCreatedFanout {
        activity: worship(sunday()),
        approvers,
    }
}

/// Fan-out after `changed` moved to `status`; `others` is the rest of the approver set.
pub(super) fn status_change(
    changed: Approver,
    name: &str,
    others: Vec<Approver>,
) -> StatusChangeFanout {
    let mut approvers = others;
    approvers.push(changed.clone());
    approvers.sort_by_key(|approver| approver.id);
    StatusChangeFanout {
        activity: worship(sunday()),
        approver: changed,
        approver_name: name.to_string(),
        approvers,
    }
}

/// Notification store refusing writes addressed to selected recipients.
#[derive(Default)]
pub(super) struct FlakyNotificationStore {
    inner: InMemoryNotificationStore,
    refused: Mutex<BTreeSet<String>>,
}

impl FlakyNotificationStore {
    pub(super) fn refuse(&self, recipient: &str) {
        self.refused
            .lock()
            .expect("flaky store mutex poisoned")
            .insert(recipient.to_string());
    }

    pub(super) fn stored(&self) -> Vec<Notification> {
        self.inner.all()
    }
}

impl NotificationRepository for FlakyNotificationStore {
    fn insert(&self, notification: NewNotification) -> Result<Notification, NotificationStoreError> {
        if self
            .refused
            .lock()
            .expect("flaky store mutex poisoned")
            .contains(&notification.recipient)
        {
            return Err(NotificationStoreError::Unavailable(
                "connection reset".to_string(),
            ));
        }
        self.inner.insert(notification)
    }

    fn fetch(&self, id: NotificationId) -> Result<Option<Notification>, NotificationStoreError> {
        self.inner.fetch(id)
    }

    fn for_recipients(
        &self,
        recipients: &[String],
        limit: usize,
    ) -> Result<Vec<Notification>, NotificationStoreError> {
        self.inner.for_recipients(recipients, limit)
    }

    fn mark_read(&self, id: NotificationId) -> Result<Notification, NotificationStoreError> {
        self.inner.mark_read(id)
    }
}

/// Push transport that never answers within the test timeout for one interest.
pub(super) struct StallingPushTransport {
    pub(super) stalled: String,
    pub(super) inner: RecordingPushTransport,
}

#[async_trait]
impl PushTransport for StallingPushTransport {
    async fn push(&self, interest: &str, payload: &PushPayload) -> Result<(), PushError> {
        if interest == self.stalled {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        self.inner.push(interest, payload).await
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
