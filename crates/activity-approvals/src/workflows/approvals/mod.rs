//! Approval routing: which memberships must approve a new activity, and how their
//! decisions are recorded.

pub mod assigner;
pub mod domain;
pub mod matcher;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use assigner::{assign_approvers, ApproverAssigner};
pub use domain::{
    Activity, ActivityId, ActivityKind, ApprovalRule, Approver, ApproverId, ApproverStatus,
    Bipra, CreateActivityRequest, FinancialAccountId, FinancialDraft, FinancialKind,
    FinancialRecord, Membership, MembershipId, Organization, OrganizationId, Position,
    PositionId, RuleId,
};
pub use matcher::{MatchInput, RuleFilter, RuleMatch, RuleMatcher};
pub use memory::{InMemoryApprovalStore, RuleDefinition};
pub use repository::{
    ActivityStore, ActivityTransaction, ApprovalStore, DirectoryRepository, RepositoryError,
    RuleRepository,
};
pub use router::approval_router;
pub use service::{
    ActivityApprovalService, ActivityCreated, ActivityDetails, ApprovalError, ApproverMatch,
};
