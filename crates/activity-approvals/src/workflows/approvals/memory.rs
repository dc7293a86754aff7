use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{Datelike, NaiveDate};

use super::domain::{
    Activity, ActivityId, ActivityKind, ApprovalRule, Approver, ApproverId, ApproverStatus,
    FinancialAccountId, FinancialDraft, FinancialKind, FinancialRecord, FinancialRecordId,
    Membership, MembershipId, NewActivity, Organization, OrganizationId, Position, PositionId,
    RuleId,
};
use super::matcher::RuleFilter;
use super::repository::{
    ActivityStore, ActivityTransaction, DirectoryRepository, RepositoryError, RuleRepository,
};

/// Rule definition accepted by [`InMemoryApprovalStore::add_rule`].
#[derive(Debug, Clone, Default)]
pub struct RuleDefinition {
    pub activity_kind: Option<ActivityKind>,
    pub financial_kind: Option<FinancialKind>,
    pub financial_account_id: Option<FinancialAccountId>,
    pub positions: Vec<PositionId>,
}

#[derive(Default)]
struct StoreState {
    organizations: BTreeMap<OrganizationId, Organization>,
    memberships: BTreeMap<MembershipId, Membership>,
    positions: BTreeMap<PositionId, Position>,
    rules: BTreeMap<RuleId, ApprovalRule>,
    activities: BTreeMap<ActivityId, Activity>,
    financial_records: BTreeMap<ActivityId, FinancialRecord>,
    approvers: BTreeMap<ApproverId, Approver>,
}

impl StoreState {
    fn has_approver(&self, activity: ActivityId, membership: MembershipId) -> bool {
        self.approvers
            .values()
            .any(|approver| approver.activity_id == activity && approver.membership_id == membership)
    }
}

/// Process-local store backing the service binary and the test-suite.
///
/// Identifiers come from a single sequence, so ids never collide across record types.
pub struct InMemoryApprovalStore {
    state: Mutex<StoreState>,
    sequence: AtomicI64,
}

impl Default for InMemoryApprovalStore {
    fn default() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            sequence: AtomicI64::new(1),
        }
    }
}

impl InMemoryApprovalStore {
    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().expect("approval store mutex poisoned")
    }

    fn next_id(&self) -> i64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Reserves ids below `floor` so seeded fixtures can use explicit identifiers.
    pub fn with_sequence_floor(floor: i64) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            sequence: AtomicI64::new(floor.max(1)),
        }
    }

    pub fn insert_organization(&self, organization: Organization) {
        self.state()
            .organizations
            .insert(organization.id, organization);
    }

    pub fn add_organization(&self, name: &str) -> Organization {
        let organization = Organization {
            id: OrganizationId(self.next_id()),
            name: name.to_string(),
        };
        self.insert_organization(organization.clone());
        organization
    }

    pub fn insert_membership(&self, membership: Membership) {
        self.state().memberships.insert(membership.id, membership);
    }

    pub fn add_membership(
        &self,
        organization: OrganizationId,
        name: &str,
        birthday: Option<NaiveDate>,
    ) -> Membership {
        let membership = Membership {
            id: MembershipId(self.next_id()),
            organization_id: organization,
            name: name.to_string(),
            birthday,
        };
        self.insert_membership(membership.clone());
        membership
    }

    pub fn insert_position(&self, position: Position) {
        self.state().positions.insert(position.id, position);
    }

    pub fn add_position(&self, organization: OrganizationId, name: &str) -> Position {
        let position = Position {
            id: PositionId(self.next_id()),
            organization_id: organization,
            name: name.to_string(),
            holder: None,
        };
        self.insert_position(position.clone());
        position
    }

    /// Seats `holder` in `position`, replacing any previous occupant.
    pub fn assign_position(
        &self,
        position: PositionId,
        holder: Option<MembershipId>,
    ) -> Result<Position, RepositoryError> {
        let mut state = self.state();
        if let Some(membership) = holder {
            let seat_org = state
                .positions
                .get(&position)
                .map(|seat| seat.organization_id)
                .ok_or(RepositoryError::NotFound)?;
            match state.memberships.get(&membership) {
                Some(member) if member.organization_id == seat_org => {}
                _ => return Err(RepositoryError::NotFound),
            }
        }

        let seat = state
            .positions
            .get_mut(&position)
            .ok_or(RepositoryError::NotFound)?;
        seat.holder = holder;
        Ok(seat.clone())
    }

    pub fn insert_rule(&self, rule: ApprovalRule) {
        self.state().rules.insert(rule.id, rule);
    }

    pub fn add_rule(&self, organization: OrganizationId, definition: RuleDefinition) -> ApprovalRule {
        let rule = ApprovalRule {
            id: RuleId(self.next_id()),
            organization_id: organization,
            activity_kind: definition.activity_kind,
            financial_kind: definition.financial_kind,
            financial_account_id: definition.financial_account_id,
            active: true,
            position_ids: definition.positions,
        };
        self.insert_rule(rule.clone());
        rule
    }

    pub fn set_rule_active(&self, rule: RuleId, active: bool) -> Result<(), RepositoryError> {
        let mut state = self.state();
        let rule = state.rules.get_mut(&rule).ok_or(RepositoryError::NotFound)?;
        rule.active = active;
        Ok(())
    }

    pub fn activities(&self) -> Vec<Activity> {
        self.state().activities.values().cloned().collect()
    }

    pub fn approvers(&self) -> Vec<Approver> {
        self.state().approvers.values().cloned().collect()
    }
}

impl RuleRepository for InMemoryApprovalStore {
    fn find_rules(&self, filter: &RuleFilter) -> Result<Vec<ApprovalRule>, RepositoryError> {
        Ok(self
            .state()
            .rules
            .values()
            .filter(|rule| filter.matches(rule))
            .cloned()
            .collect())
    }
}

impl DirectoryRepository for InMemoryApprovalStore {
    fn organization(&self, id: OrganizationId) -> Result<Option<Organization>, RepositoryError> {
        Ok(self.state().organizations.get(&id).cloned())
    }

    fn membership(&self, id: MembershipId) -> Result<Option<Membership>, RepositoryError> {
        Ok(self.state().memberships.get(&id).cloned())
    }

    fn occupants(
        &self,
        organization: OrganizationId,
        positions: &BTreeSet<PositionId>,
    ) -> Result<Vec<Membership>, RepositoryError> {
        let state = self.state();
        let holders: BTreeSet<MembershipId> = positions
            .iter()
            .filter_map(|id| state.positions.get(id))
            .filter(|position| position.organization_id == organization)
            .filter_map(|position| position.holder)
            .collect();

        Ok(holders
            .iter()
            .filter_map(|id| state.memberships.get(id))
            .filter(|membership| membership.organization_id == organization)
            .cloned()
            .collect())
    }

    fn birthdays_on(&self, month: u32, day: u32) -> Result<Vec<Membership>, RepositoryError> {
        Ok(self
            .state()
            .memberships
            .values()
            .filter(|membership| {
                membership
                    .birthday
                    .is_some_and(|date| date.month() == month && date.day() == day)
            })
            .cloned()
            .collect())
    }
}

impl ActivityStore for InMemoryApprovalStore {
    fn begin(&self) -> Result<Box<dyn ActivityTransaction + '_>, RepositoryError> {
        Ok(Box::new(InMemoryTransaction {
            store: self,
            activities: Vec::new(),
            financial_records: Vec::new(),
            approvers: Vec::new(),
        }))
    }

    fn activity(&self, id: ActivityId) -> Result<Option<Activity>, RepositoryError> {
        Ok(self.state().activities.get(&id).cloned())
    }

    fn financial_record(
        &self,
        activity: ActivityId,
    ) -> Result<Option<FinancialRecord>, RepositoryError> {
        Ok(self.state().financial_records.get(&activity).cloned())
    }

    fn approver(&self, id: ApproverId) -> Result<Option<Approver>, RepositoryError> {
        Ok(self.state().approvers.get(&id).cloned())
    }

    fn approvers_for(&self, activity: ActivityId) -> Result<Vec<Approver>, RepositoryError> {
        Ok(self
            .state()
            .approvers
            .values()
            .filter(|approver| approver.activity_id == activity)
            .cloned()
            .collect())
    }

    fn set_approver_status(
        &self,
        id: ApproverId,
        status: ApproverStatus,
    ) -> Result<Approver, RepositoryError> {
        let mut state = self.state();
        let approver = state
            .approvers
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        approver.status = status;
        Ok(approver.clone())
    }
}

/// Writes staged against [`InMemoryApprovalStore`] and applied together on commit.
pub struct InMemoryTransaction<'a> {
    store: &'a InMemoryApprovalStore,
    activities: Vec<Activity>,
    financial_records: Vec<FinancialRecord>,
    approvers: Vec<Approver>,
}

impl InMemoryTransaction<'_> {
    fn knows_activity(&self, state: &StoreState, id: ActivityId) -> bool {
        state.activities.contains_key(&id) || self.activities.iter().any(|staged| staged.id == id)
    }
}

impl ActivityTransaction for InMemoryTransaction<'_> {
    fn insert_activity(&mut self, activity: NewActivity) -> Result<Activity, RepositoryError> {
        {
            let state = self.store.state();
            if !state.organizations.contains_key(&activity.organization_id) {
                return Err(RepositoryError::NotFound);
            }
            match state.memberships.get(&activity.supervisor_id) {
                Some(member) if member.organization_id == activity.organization_id => {}
                _ => return Err(RepositoryError::NotFound),
            }
        }

        let stored = Activity {
            id: ActivityId(self.store.next_id()),
            organization_id: activity.organization_id,
            supervisor_id: activity.supervisor_id,
            title: activity.title,
            kind: activity.kind,
            bipra: activity.bipra,
            date: activity.date,
            note: activity.note,
        };
        self.activities.push(stored.clone());
        Ok(stored)
    }

    fn insert_financial_record(
        &mut self,
        activity: ActivityId,
        draft: &FinancialDraft,
    ) -> Result<FinancialRecord, RepositoryError> {
        {
            let state = self.store.state();
            if !self.knows_activity(&state, activity) {
                return Err(RepositoryError::NotFound);
            }
            if state.financial_records.contains_key(&activity) {
                return Err(RepositoryError::Conflict);
            }
        }
        if self
            .financial_records
            .iter()
            .any(|record| record.activity_id == activity)
        {
            return Err(RepositoryError::Conflict);
        }

        let record = FinancialRecord {
            id: FinancialRecordId(self.store.next_id()),
            activity_id: activity,
            kind: draft.kind,
            account_id: draft.account_id,
            amount: draft.amount,
        };
        self.financial_records.push(record.clone());
        Ok(record)
    }

    fn insert_approver(
        &mut self,
        activity: ActivityId,
        membership: MembershipId,
    ) -> Result<Approver, RepositoryError> {
        let duplicate = || RepositoryError::DuplicateApprover {
            activity_id: activity,
            membership_id: membership,
        };

        {
            let state = self.store.state();
            if !self.knows_activity(&state, activity) || !state.memberships.contains_key(&membership)
            {
                return Err(RepositoryError::NotFound);
            }
            if state.has_approver(activity, membership) {
                return Err(duplicate());
            }
        }
        if self
            .approvers
            .iter()
            .any(|staged| staged.activity_id == activity && staged.membership_id == membership)
        {
            return Err(duplicate());
        }

        let approver = Approver {
            id: ApproverId(self.store.next_id()),
            activity_id: activity,
            membership_id: membership,
            status: ApproverStatus::Unconfirmed,
        };
        self.approvers.push(approver.clone());
        Ok(approver)
    }

    fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let InMemoryTransaction {
            store,
            activities,
            financial_records,
            approvers,
        } = *self;

        let mut state = store.state();
        if let Some(clash) = approvers
            .iter()
            .find(|staged| state.has_approver(staged.activity_id, staged.membership_id))
        {
            return Err(RepositoryError::DuplicateApprover {
                activity_id: clash.activity_id,
                membership_id: clash.membership_id,
            });
        }

        for activity in activities {
            state.activities.insert(activity.id, activity);
        }
        for record in financial_records {
            state.financial_records.insert(record.activity_id, record);
        }
        for approver in approvers {
            state.approvers.insert(approver.id, approver);
        }
        Ok(())
    }
}
