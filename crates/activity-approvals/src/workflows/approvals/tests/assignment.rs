use super::common::*;
use std::collections::BTreeSet;

use crate::workflows::approvals::assigner::{assign_approvers, ApproverAssigner};
use crate::workflows::approvals::domain::{ApproverStatus, MembershipId, PositionId, RuleId};
use crate::workflows::approvals::matcher::RuleMatch;
use crate::workflows::approvals::repository::{ActivityStore, ActivityTransaction, RepositoryError};

fn matched(positions: &[PositionId]) -> RuleMatch {
    RuleMatch {
        matched_rule_ids: vec![RuleId(1)],
        position_ids: positions.iter().copied().collect::<BTreeSet<_>>(),
    }
}

fn member_ids(members: &[crate::workflows::approvals::domain::Membership]) -> Vec<MembershipId> {
    members.iter().map(|member| member.id).collect()
}

#[test]
fn membership_holding_two_matched_seats_is_listed_once() {
    let store = seeded_store();
    store.insert_position(seat(PositionId(4), ORG, Some(TREASURER)));

    let resolved = ApproverAssigner::new(store.as_ref())
        .resolve(ORG, &matched(&[SEAT_SERVICE, PositionId(4)]))
        .expect("resolve succeeds");

    assert_eq!(member_ids(&resolved), vec![TREASURER]);
}

#[test]
fn vacant_seats_contribute_nobody() {
    let store = seeded_store();
    store
        .assign_position(SEAT_SERVICE, None)
        .expect("seat exists");

    let resolved = ApproverAssigner::new(store.as_ref())
        .resolve(ORG, &matched(&[SEAT_SERVICE]))
        .expect("resolve succeeds");

    assert!(resolved.is_empty());
}

#[test]
fn empty_position_set_resolves_to_no_memberships() {
    let store = seeded_store();
    let resolved = ApproverAssigner::new(store.as_ref())
        .resolve(ORG, &RuleMatch::default())
        .expect("resolve succeeds");
    assert!(resolved.is_empty());
}

#[test]
fn supervisor_holding_a_matched_seat_is_kept() {
    let store = seeded_store();
    store
        .assign_position(SEAT_SERVICE, Some(SUPERVISOR))
        .expect("seat exists");

    let resolved = ApproverAssigner::new(store.as_ref())
        .resolve(ORG, &matched(&[SEAT_SERVICE, SEAT_GENERIC]))
        .expect("resolve succeeds");

    assert_eq!(member_ids(&resolved), vec![ELDER, SUPERVISOR]);
}

#[test]
fn seats_of_other_organizations_are_not_resolved() {
    let store = seeded_store();
    let resolved = ApproverAssigner::new(store.as_ref())
        .resolve(ORG, &matched(&[SEAT_SERVICE, SEAT_OTHER_ORG]))
        .expect("resolve succeeds");

    assert_eq!(member_ids(&resolved), vec![TREASURER]);
}

#[test]
fn reassigning_a_seat_to_another_organization_member_is_refused() {
    let store = seeded_store();
    let result = store.assign_position(SEAT_SERVICE, Some(OUTSIDER));
    assert_eq!(result, Err(RepositoryError::NotFound));
}

#[test]
fn approvers_start_unconfirmed() {
    let store = seeded_store();
    let members = ApproverAssigner::new(store.as_ref())
        .resolve(ORG, &matched(&[SEAT_SERVICE, SEAT_GENERIC]))
        .expect("resolve succeeds");

    let mut tx = store.begin().expect("transaction opens");
    let activity = tx
        .insert_activity(service_request().new_activity())
        .expect("activity staged");
    let approvers = assign_approvers(tx.as_mut(), activity.id, &members).expect("approvers staged");
    tx.commit().expect("commit succeeds");

    assert_eq!(approvers.len(), 2);
    assert!(approvers
        .iter()
        .all(|approver| approver.status == ApproverStatus::Unconfirmed));
    assert_eq!(
        store.approvers_for(activity.id).expect("read approvers"),
        approvers
    );
}

#[test]
fn duplicate_approver_aborts_the_whole_unit() {
    let store = seeded_store();
    let treasurer = member(TREASURER, ORG, "Grace Mandagi");

    let mut tx = store.begin().expect("transaction opens");
    let activity = tx
        .insert_activity(service_request().new_activity())
        .expect("activity staged");
    let result = assign_approvers(tx.as_mut(), activity.id, &[treasurer.clone(), treasurer]);

    assert_eq!(
        result,
        Err(RepositoryError::DuplicateApprover {
            activity_id: activity.id,
            membership_id: TREASURER,
        })
    );
    drop(tx);

    assert!(store.activities().is_empty());
    assert!(store.approvers().is_empty());
    assert_eq!(store.activity(activity.id).expect("read"), None);
}

#[test]
fn committed_pairs_cannot_be_inserted_again() {
    let store = seeded_store();
    let treasurer = member(TREASURER, ORG, "Grace Mandagi");

    let mut tx = store.begin().expect("transaction opens");
    let activity = tx
        .insert_activity(service_request().new_activity())
        .expect("activity staged");
    assign_approvers(tx.as_mut(), activity.id, &[treasurer.clone()]).expect("first insert");
    tx.commit().expect("commit succeeds");

    let mut retry = store.begin().expect("transaction opens");
    let result = retry.insert_approver(activity.id, treasurer.id);
    assert!(matches!(
        result,
        Err(RepositoryError::DuplicateApprover { .. })
    ));
}
