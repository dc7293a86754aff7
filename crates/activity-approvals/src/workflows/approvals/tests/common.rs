use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::approvals::domain::{
    ActivityKind, ApprovalRule, Bipra, CreateActivityRequest, FinancialAccountId, FinancialDraft,
    FinancialKind, Membership, MembershipId, Organization, OrganizationId, Position, PositionId,
    RuleId,
};
use crate::workflows::approvals::matcher::MatchInput;
use crate::workflows::approvals::memory::InMemoryApprovalStore;
use crate::workflows::approvals::service::ActivityApprovalService;
use crate::workflows::notifications::sink::{FanoutTask, NotificationSink};

pub(super) const ORG: OrganizationId = OrganizationId(5);
pub(super) const OTHER_ORG: OrganizationId = OrganizationId(6);
pub(super) const TREASURER: MembershipId = MembershipId(10);
pub(super) const ELDER: MembershipId = MembershipId(20);
pub(super) const SUPERVISOR: MembershipId = MembershipId(99);
pub(super) const OUTSIDER: MembershipId = MembershipId(77);
pub(super) const SEAT_SERVICE: PositionId = PositionId(1);
pub(super) const SEAT_GENERIC: PositionId = PositionId(2);
pub(super) const SEAT_OTHER_ORG: PositionId = PositionId(3);
pub(super) const RULE_SERVICE: RuleId = RuleId(100);
pub(super) const RULE_GENERIC: RuleId = RuleId(101);
pub(super) const RULE_OTHER_ORG: RuleId = RuleId(102);

#[derive(Default)]
pub(super) struct RecordingSink {
    tasks: Mutex<Vec<FanoutTask>>,
}

impl RecordingSink {
    pub(super) fn tasks(&self) -> Vec<FanoutTask> {
        self.tasks.lock().expect("sink mutex poisoned").clone()
    }
}

impl NotificationSink for RecordingSink {
    fn submit(&self, task: FanoutTask) {
        self.tasks.lock().expect("sink mutex poisoned").push(task);
    }
}

pub(super) fn member(id: MembershipId, organization: OrganizationId, name: &str) -> Membership {
    Membership {
        id,
        organization_id: organization,
        name: name.to_string(),
        birthday: NaiveDate::from_ymd_opt(1980, 6, 1),
    }
}

pub(super) fn seat(id: PositionId, organization: OrganizationId, holder: Option<MembershipId>) -> Position {
    Position {
        id,
        organization_id: organization,
        name: format!("seat-{}", id.0),
        holder,
    }
}

pub(super) fn rule(id: RuleId, organization: OrganizationId, positions: &[PositionId]) -> ApprovalRule {
    ApprovalRule {
        id,
        organization_id: organization,
        activity_kind: None,
        financial_kind: None,
        financial_account_id: None,
        active: true,
        position_ids: positions.to_vec(),
    }
}

/// Organization 5 with one SERVICE rule (seat held by member 10) and one generic rule
/// (seat held by member 20). Organization 6 carries a SERVICE rule of its own.
pub(super) fn seeded_store() -> Arc<InMemoryApprovalStore> {
    let store = InMemoryApprovalStore::with_sequence_floor(1_000);
    store.insert_organization(Organization {
        id: ORG,
        name: "GMIM Bukit Moria".to_string(),
    });
    store.insert_organization(Organization {
        id: OTHER_ORG,
        name: "GMIM Efrata".to_string(),
    });

    store.insert_membership(member(TREASURER, ORG, "Grace Mandagi"));
    store.insert_membership(member(ELDER, ORG, "Yohanes Lumi"));
    store.insert_membership(member(SUPERVISOR, ORG, "Maria Wowor"));
    store.insert_membership(member(OUTSIDER, OTHER_ORG, "Daniel Rondonuwu"));

    store.insert_position(seat(SEAT_SERVICE, ORG, Some(TREASURER)));
    store.insert_position(seat(SEAT_GENERIC, ORG, Some(ELDER)));
    store.insert_position(seat(SEAT_OTHER_ORG, OTHER_ORG, Some(OUTSIDER)));

    let mut service_rule = rule(RULE_SERVICE, ORG, &[SEAT_SERVICE]);
    service_rule.activity_kind = Some(ActivityKind::Service);
    store.insert_rule(service_rule);
    store.insert_rule(rule(RULE_GENERIC, ORG, &[SEAT_GENERIC]));

    let mut foreign = rule(RULE_OTHER_ORG, OTHER_ORG, &[SEAT_OTHER_ORG]);
    foreign.activity_kind = Some(ActivityKind::Event);
    store.insert_rule(foreign);

    Arc::new(store)
}

pub(super) fn build_service(
    store: Arc<InMemoryApprovalStore>,
) -> (
    ActivityApprovalService<InMemoryApprovalStore, RecordingSink>,
    Arc<RecordingSink>,
) {
    let sink = Arc::new(RecordingSink::default());
    let service = ActivityApprovalService::new(store, sink.clone());
    (service, sink)
}

pub(super) fn match_input(kind: ActivityKind) -> MatchInput {
    MatchInput {
        organization_id: ORG,
        activity_kind: kind,
        supervisor_membership_id: SUPERVISOR,
        financial_account_id: None,
        financial_kind: None,
    }
}

pub(super) fn financial_input(
    kind: ActivityKind,
    financial_kind: FinancialKind,
    account: i64,
) -> MatchInput {
    MatchInput {
        financial_account_id: Some(FinancialAccountId(account)),
        financial_kind: Some(financial_kind),
        ..match_input(kind)
    }
}

pub(super) fn service_request() -> CreateActivityRequest {
    CreateActivityRequest {
        organization_id: ORG,
        supervisor_id: SUPERVISOR,
        title: "Sunday Worship".to_string(),
        kind: ActivityKind::Service,
        bipra: Bipra::Pkb,
        date: NaiveDate::from_ymd_opt(2025, 10, 12)
            .and_then(|day| day.and_hms_opt(9, 0, 0)),
        note: None,
        financial: None,
    }
}

pub(super) fn expense_request(account: i64) -> CreateActivityRequest {
    CreateActivityRequest {
        kind: ActivityKind::Event,
        title: "Youth retreat".to_string(),
        financial: Some(FinancialDraft {
            kind: FinancialKind::Expense,
            account_id: FinancialAccountId(account),
            amount: 2_500_000,
        }),
        ..service_request()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
