use std::sync::Arc;
use std::time::Duration;

use activity_approvals::workflows::approvals::{
    ActivityApprovalService, ActivityKind, ApproverStatus, Bipra, CreateActivityRequest,
    InMemoryApprovalStore, RuleDefinition,
};
use activity_approvals::workflows::notifications::{
    InMemoryNotificationStore, NotificationDispatcher, NotificationKind, NotificationOutbox,
    RecordingPushTransport,
};
use chrono::NaiveDate;

struct Parish {
    store: Arc<InMemoryApprovalStore>,
    organization: activity_approvals::workflows::approvals::OrganizationId,
    supervisor: activity_approvals::workflows::approvals::MembershipId,
    treasurer: activity_approvals::workflows::approvals::MembershipId,
}

fn parish() -> Parish {
    let store = Arc::new(InMemoryApprovalStore::default());
    let organization = store.add_organization("GMIM Bukit Moria").id;
    let supervisor = store
        .add_membership(organization, "Maria Wowor", None)
        .id;
    let treasurer = store
        .add_membership(organization, "Grace Mandagi", None)
        .id;

    let seat = store.add_position(organization, "Treasurer");
    store
        .assign_position(seat.id, Some(treasurer))
        .expect("treasurer seated");
    store.add_rule(
        organization,
        RuleDefinition {
            activity_kind: Some(ActivityKind::Service),
            financial_kind: None,
            financial_account_id: None,
            positions: vec![seat.id],
        },
    );

    Parish {
        store,
        organization,
        supervisor,
        treasurer,
    }
}

#[tokio::test]
async fn created_activity_fans_out_to_group_and_single_approver() {
    let parish = parish();
    let notifications = InMemoryNotificationStore::default();
    let push = RecordingPushTransport::default();
    let dispatcher = Arc::new(NotificationDispatcher::new(
        Arc::new(notifications.clone()),
        Arc::new(push.clone()),
        Duration::from_secs(5),
    ));
    let (outbox, worker) = NotificationOutbox::spawn(dispatcher, 16);
    let service = ActivityApprovalService::new(parish.store.clone(), Arc::new(outbox));

    let created = service
        .create_activity(CreateActivityRequest {
            organization_id: parish.organization,
            supervisor_id: parish.supervisor,
            title: "Sunday Worship".to_string(),
            kind: ActivityKind::Service,
            bipra: Bipra::Pkb,
            date: NaiveDate::from_ymd_opt(2025, 10, 12).and_then(|day| day.and_hms_opt(9, 0, 0)),
            note: None,
            financial: None,
        })
        .expect("activity created");
    assert_eq!(created.approvers.len(), 1);
    assert_eq!(created.approvers[0].membership_id, parish.treasurer);

    drop(service);
    worker.join().await;

    let rows = notifications.all();
    assert_eq!(rows.len(), 2, "one group row plus one approver row");
    let group = format!("organization.{}_group.PKB", parish.organization);
    let approver = format!("membership.{}", parish.treasurer);
    assert!(rows
        .iter()
        .any(|row| row.kind == NotificationKind::ActivityCreated && row.recipient == group));
    assert!(rows
        .iter()
        .any(|row| row.kind == NotificationKind::ApprovalRequired && row.recipient == approver));
    assert_eq!(push.delivered().len(), 2);
}

#[tokio::test]
async fn approval_reaches_the_supervisor_after_the_write_commits() {
    let parish = parish();
    let notifications = InMemoryNotificationStore::default();
    let dispatcher = Arc::new(NotificationDispatcher::new(
        Arc::new(notifications.clone()),
        Arc::new(RecordingPushTransport::default()),
        Duration::from_secs(5),
    ));
    let (outbox, worker) = NotificationOutbox::spawn(dispatcher, 16);
    let service = ActivityApprovalService::new(parish.store.clone(), Arc::new(outbox));

    let created = service
        .create_activity(CreateActivityRequest {
            organization_id: parish.organization,
            supervisor_id: parish.supervisor,
            title: "Harvest thanksgiving".to_string(),
            kind: ActivityKind::Service,
            bipra: Bipra::General,
            date: None,
            note: Some("Bring produce to the front".to_string()),
            financial: None,
        })
        .expect("activity created");
    let updated = service
        .update_approver_status(created.approvers[0].id, ApproverStatus::Approved)
        .expect("approved");
    assert_eq!(updated.status, ApproverStatus::Approved);

    drop(service);
    worker.join().await;

    let supervisor = format!("membership.{}", parish.supervisor);
    let confirmations: Vec<_> = notifications
        .all()
        .into_iter()
        .filter(|row| row.kind == NotificationKind::ApprovalConfirmed)
        .collect();
    assert_eq!(confirmations.len(), 1);
    assert_eq!(confirmations[0].recipient, supervisor);
    assert_eq!(
        confirmations[0].body,
        "Grace Mandagi approved \"Harvest thanksgiving\""
    );
}
