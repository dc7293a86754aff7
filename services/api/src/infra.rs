use activity_approvals::config::NotificationConfig;
use activity_approvals::workflows::approvals::{
    ActivityApprovalService, ActivityKind, FinancialKind, InMemoryApprovalStore, MembershipId,
    OrganizationId, RepositoryError, RuleDefinition,
};
use activity_approvals::workflows::notifications::{
    InMemoryNotificationStore, NotificationDispatcher, NotificationInbox, NotificationOutbox,
    OutboxWorker, PushError, PushPayload, PushTransport,
};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Push transport for deployments without a push backend: every message is logged.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LoggingPushTransport;

#[async_trait]
impl PushTransport for LoggingPushTransport {
    async fn push(&self, interest: &str, payload: &PushPayload) -> Result<(), PushError> {
        info!(%interest, title = %payload.title, "push message emitted");
        Ok(())
    }
}

pub(crate) type Dispatcher = NotificationDispatcher<InMemoryNotificationStore, LoggingPushTransport>;
pub(crate) type ApprovalService = ActivityApprovalService<InMemoryApprovalStore, NotificationOutbox>;

/// Process-local wiring of stores, dispatcher and the background outbox.
pub(crate) struct Platform {
    pub(crate) directory: Arc<InMemoryApprovalStore>,
    pub(crate) notifications: Arc<InMemoryNotificationStore>,
    pub(crate) dispatcher: Arc<Dispatcher>,
    pub(crate) service: Arc<ApprovalService>,
    pub(crate) inbox: Arc<NotificationInbox<InMemoryNotificationStore>>,
}

impl Platform {
    /// Requires a running tokio runtime: the outbox worker is spawned immediately.
    pub(crate) fn start(config: &NotificationConfig) -> (Self, OutboxWorker) {
        let directory = Arc::new(InMemoryApprovalStore::default());
        let notifications = Arc::new(InMemoryNotificationStore::default());
        let dispatcher = Arc::new(NotificationDispatcher::new(
            notifications.clone(),
            Arc::new(LoggingPushTransport),
            config.push_timeout,
        ));
        let (outbox, worker) = NotificationOutbox::spawn(dispatcher.clone(), config.outbox_capacity);
        let service = Arc::new(ActivityApprovalService::new(
            directory.clone(),
            Arc::new(outbox),
        ));
        let inbox = Arc::new(NotificationInbox::new(notifications.clone()));

        (
            Self {
                directory,
                notifications,
                dispatcher,
                service,
                inbox,
            },
            worker,
        )
    }
}

/// Identifiers of the sample congregation created by [`seed_demo`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct DemoParish {
    pub(crate) organization: OrganizationId,
    pub(crate) pastor: MembershipId,
    pub(crate) treasurer: MembershipId,
    pub(crate) elder: MembershipId,
}

/// Seeds one congregation with a SERVICE rule for the treasurer, a generic rule for the
/// elder and an expense rule routed to the treasurer. One member has a birthday on `today`.
pub(crate) fn seed_demo(
    store: &InMemoryApprovalStore,
    today: NaiveDate,
) -> Result<DemoParish, RepositoryError> {
    let organization = store.add_organization("GMIM Bukit Moria").id;
    let pastor = store
        .add_membership(organization, "Pdt. Maria Wowor", NaiveDate::from_ymd_opt(1978, 4, 2))
        .id;
    let treasurer = store
        .add_membership(organization, "Grace Mandagi", NaiveDate::from_ymd_opt(1985, 11, 30))
        .id;
    let elder = store
        .add_membership(organization, "Yohanes Lumi", NaiveDate::from_ymd_opt(1962, 1, 17))
        .id;
    // 1992 is a leap year, so any calendar day maps onto it
    store.add_membership(organization, "Ruth Sumampouw", today.with_year(1992));

    let treasury = store.add_position(organization, "Bendahara");
    let council = store.add_position(organization, "Penatua");
    store.assign_position(treasury.id, Some(treasurer))?;
    store.assign_position(council.id, Some(elder))?;

    store.add_rule(
        organization,
        RuleDefinition {
            activity_kind: Some(ActivityKind::Service),
            financial_kind: None,
            financial_account_id: None,
            positions: vec![treasury.id],
        },
    );
    store.add_rule(
        organization,
        RuleDefinition {
            activity_kind: None,
            financial_kind: None,
            financial_account_id: None,
            positions: vec![council.id],
        },
    );
    store.add_rule(
        organization,
        RuleDefinition {
            activity_kind: None,
            financial_kind: Some(FinancialKind::Expense),
            financial_account_id: None,
            positions: vec![treasury.id],
        },
    );

    Ok(DemoParish {
        organization,
        pastor,
        treasurer,
        elder,
    })
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}
