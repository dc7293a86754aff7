use std::collections::BTreeSet;

use super::domain::{
    Activity, ActivityId, ApprovalRule, Approver, ApproverId, ApproverStatus, FinancialDraft,
    FinancialRecord, Membership, MembershipId, NewActivity, Organization, OrganizationId,
    PositionId,
};
use super::matcher::RuleFilter;

/// Error enumeration for data-access failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("membership {membership_id} is already an approver of activity {activity_id}")]
    DuplicateApprover {
        activity_id: ActivityId,
        membership_id: MembershipId,
    },
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Read access to administrator-managed approval rules.
pub trait RuleRepository: Send + Sync {
    /// Rules satisfying `filter`. Implementations must honour the organization and
    /// `active` constraints carried by every filter variant.
    fn find_rules(&self, filter: &RuleFilter) -> Result<Vec<ApprovalRule>, RepositoryError>;
}

/// Read access to organizations, memberships and the positions they occupy.
pub trait DirectoryRepository: Send + Sync {
    fn organization(&self, id: OrganizationId) -> Result<Option<Organization>, RepositoryError>;
    fn membership(&self, id: MembershipId) -> Result<Option<Membership>, RepositoryError>;
    /// Memberships of `organization` currently holding any of `positions`, each listed once.
    fn occupants(
        &self,
        organization: OrganizationId,
        positions: &BTreeSet<PositionId>,
    ) -> Result<Vec<Membership>, RepositoryError>;
    /// Memberships across all organizations whose birthday falls on `month`/`day`.
    fn birthdays_on(&self, month: u32, day: u32) -> Result<Vec<Membership>, RepositoryError>;
}

/// Authoritative activity/approver storage.
pub trait ActivityStore: Send + Sync {
    /// Opens an atomic unit. Dropping the transaction without `commit` discards it.
    fn begin(&self) -> Result<Box<dyn ActivityTransaction + '_>, RepositoryError>;
    fn activity(&self, id: ActivityId) -> Result<Option<Activity>, RepositoryError>;
    fn financial_record(
        &self,
        activity: ActivityId,
    ) -> Result<Option<FinancialRecord>, RepositoryError>;
    fn approver(&self, id: ApproverId) -> Result<Option<Approver>, RepositoryError>;
    fn approvers_for(&self, activity: ActivityId) -> Result<Vec<Approver>, RepositoryError>;
    /// Unconditional status write (last write wins).
    fn set_approver_status(
        &self,
        id: ApproverId,
        status: ApproverStatus,
    ) -> Result<Approver, RepositoryError>;
}

/// Staged writes for a single activity creation.
pub trait ActivityTransaction {
    fn insert_activity(&mut self, activity: NewActivity) -> Result<Activity, RepositoryError>;
    fn insert_financial_record(
        &mut self,
        activity: ActivityId,
        draft: &FinancialDraft,
    ) -> Result<FinancialRecord, RepositoryError>;
    /// Inserts an UNCONFIRMED approver, failing with `DuplicateApprover` when the
    /// `(activity, membership)` pair already exists.
    fn insert_approver(
        &mut self,
        activity: ActivityId,
        membership: MembershipId,
    ) -> Result<Approver, RepositoryError>;
    fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// Everything the approval service needs from storage.
pub trait ApprovalStore: RuleRepository + DirectoryRepository + ActivityStore {}

impl<T> ApprovalStore for T where T: RuleRepository + DirectoryRepository + ActivityStore {}
