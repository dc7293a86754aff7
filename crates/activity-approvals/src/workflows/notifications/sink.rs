use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use super::dispatcher::{FanoutReport, NotificationDispatcher};
use super::repository::{NotificationRepository, PushTransport};
use crate::workflows::approvals::domain::{Activity, ActivityId, Approver};

/// Snapshot handed over after an activity creation commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityCreatedFanout {
    pub activity: Activity,
    pub approvers: Vec<Approver>,
}

/// Snapshot handed over after an approver status write commits.
///
/// `approvers` is read once, after the write, and is the only source of recipients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChangeFanout {
    pub activity: Activity,
    pub approver: Approver,
    pub approver_name: String,
    pub approvers: Vec<Approver>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FanoutTask {
    ActivityCreated(ActivityCreatedFanout),
    StatusChanged(StatusChangeFanout),
}

impl FanoutTask {
    pub fn activity_id(&self) -> ActivityId {
        match self {
            FanoutTask::ActivityCreated(fanout) => fanout.activity.id,
            FanoutTask::StatusChanged(change) => change.activity.id,
        }
    }
}

/// Boundary between the authoritative write path and best-effort delivery.
///
/// `submit` must return promptly and must not report delivery outcomes to the caller.
pub trait NotificationSink: Send + Sync {
    fn submit(&self, task: FanoutTask);
}

/// Sink that queues fan-outs on a bounded channel drained by a background worker.
#[derive(Clone)]
pub struct NotificationOutbox {
    sender: mpsc::Sender<FanoutTask>,
}

/// Handle on the worker draining a [`NotificationOutbox`].
pub struct OutboxWorker {
    handle: JoinHandle<()>,
}

impl NotificationOutbox {
    /// Spawns the drain loop on the current tokio runtime.
    pub fn spawn<N, P>(
        dispatcher: Arc<NotificationDispatcher<N, P>>,
        capacity: usize,
    ) -> (Self, OutboxWorker)
    where
        N: NotificationRepository + 'static,
        P: PushTransport + 'static,
    {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(drain(dispatcher, receiver));
        (Self { sender }, OutboxWorker { handle })
    }
}

impl NotificationSink for NotificationOutbox {
    fn submit(&self, task: FanoutTask) {
        let activity_id = task.activity_id();
        match self.sender.try_send(task) {
            Ok(()) => debug!(%activity_id, "fan-out queued"),
            Err(TrySendError::Full(_)) => {
                warn!(%activity_id, "notification outbox full; fan-out dropped")
            }
            Err(TrySendError::Closed(_)) => {
                warn!(%activity_id, "notification outbox closed; fan-out dropped")
            }
        }
    }
}

impl OutboxWorker {
    /// Waits for queued fan-outs to finish. Resolves once every outbox clone is dropped.
    pub async fn join(self) {
        if let Err(err) = self.handle.await {
            error!(error = %err, "notification outbox worker aborted");
        }
    }
}

async fn drain<N, P>(
    dispatcher: Arc<NotificationDispatcher<N, P>>,
    mut receiver: mpsc::Receiver<FanoutTask>,
) where
    N: NotificationRepository + 'static,
    P: PushTransport + 'static,
{
    let mut in_flight = JoinSet::new();

    while let Some(task) = receiver.recv().await {
        let dispatcher = Arc::clone(&dispatcher);
        in_flight.spawn(async move {
            let report = dispatcher.dispatch(&task).await;
            (task.activity_id(), report)
        });

        // reap finished fan-outs
        while let Some(joined) = in_flight.try_join_next() {
            log_completion(joined);
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        log_completion(joined);
    }
    info!("notification outbox drained");
}

fn log_completion(
    joined: Result<(ActivityId, FanoutReport), tokio::task::JoinError>,
) {
    match joined {
        Ok((activity_id, report)) => debug!(
            %activity_id,
            recorded = report.recorded.len(),
            pushed = report.pushed,
            failures = report.failures.len(),
            "fan-out finished"
        ),
        Err(err) => error!(error = %err, "fan-out task panicked"),
    }
}
