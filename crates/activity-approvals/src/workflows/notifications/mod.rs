//! Notification fan-out for approval events and scheduled reminders.
//!
//! Everything here is best effort: failures are logged per recipient and never reach the
//! caller that committed the underlying write.

pub mod dedupe;
pub mod dispatcher;
pub mod domain;
pub mod inbox;
pub mod interest;
pub mod memory;
pub mod reminders;
pub mod repository;
pub mod router;
pub mod sink;

#[cfg(test)]
mod tests;

pub use dedupe::{BatchReport, DedupeGuard, ScheduledNotification, ScheduledOutcome};
pub use dispatcher::{DeliveryFailure, FanoutReport, NotificationDispatcher};
pub use domain::{
    DedupeKey, NewNotification, Notification, NotificationId, NotificationKind, PushPayload,
};
pub use inbox::NotificationInbox;
pub use interest::{ColumnId, Interest, GLOBAL_INTEREST};
pub use memory::{InMemoryNotificationStore, RecordingPushTransport};
pub use reminders::BirthdayReminderJob;
pub use repository::{NotificationRepository, NotificationStoreError, PushError, PushTransport};
pub use router::notification_router;
pub use sink::{
    ActivityCreatedFanout, FanoutTask, NotificationOutbox, NotificationSink, OutboxWorker,
    StatusChangeFanout,
};
