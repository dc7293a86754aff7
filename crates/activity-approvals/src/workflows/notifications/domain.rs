use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::workflows::approvals::domain::ActivityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub i64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    ActivityCreated,
    ApprovalRequired,
    ApprovalConfirmed,
    ApprovalRejected,
    BirthdayReminder,
}

impl NotificationKind {
    pub fn code(&self) -> &'static str {
        match self {
            NotificationKind::ActivityCreated => "ACTIVITY_CREATED",
            NotificationKind::ApprovalRequired => "APPROVAL_REQUIRED",
            NotificationKind::ApprovalConfirmed => "APPROVAL_CONFIRMED",
            NotificationKind::ApprovalRejected => "APPROVAL_REJECTED",
            NotificationKind::BirthdayReminder => "BIRTHDAY_REMINDER",
        }
    }
}

/// Uniqueness token for scheduled notifications: `<subject>:<recipient>:<YYYY-MM-DD>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DedupeKey(pub String);

impl DedupeKey {
    pub fn derive(subject: &str, recipient: &str, day: NaiveDate) -> Self {
        Self(format!("{subject}:{recipient}:{}", day.format("%Y-%m-%d")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DedupeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted record of one delivered (or attempted) message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub body: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub recipient: String,
    pub is_read: bool,
    pub activity_id: Option<ActivityId>,
    pub dedupe_key: Option<DedupeKey>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Notification columns supplied by the writer; the store fills in the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    pub recipient: String,
    pub activity_id: Option<ActivityId>,
    pub dedupe_key: Option<DedupeKey>,
}

impl NewNotification {
    pub fn new(
        kind: NotificationKind,
        recipient: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            kind,
            recipient: recipient.into(),
            activity_id: None,
            dedupe_key: None,
        }
    }

    pub fn for_activity(mut self, activity: ActivityId) -> Self {
        self.activity_id = Some(activity);
        self
    }

    pub fn with_dedupe_key(mut self, key: DedupeKey) -> Self {
        self.dedupe_key = Some(key);
        self
    }

    /// Push payload mirroring this notification's title and body.
    pub fn payload(&self) -> PushPayload {
        let mut data = Map::new();
        data.insert("type".to_string(), Value::from(self.kind.code()));
        let deep_link = self.activity_id.map(|activity| {
            data.insert("activityId".to_string(), Value::from(activity.0));
            format!("/activities/{}", activity.0)
        });

        PushPayload {
            title: self.title.clone(),
            body: self.body.clone(),
            deep_link,
            data: Some(data),
        }
    }
}

/// Platform-neutral push message; channel framing belongs to the transport adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}
