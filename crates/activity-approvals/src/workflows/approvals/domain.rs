use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Identifier of the organization (church) every record is scoped to.
    OrganizationId
);
record_id!(MembershipId);
record_id!(PositionId);
record_id!(RuleId);
record_id!(ActivityId);
record_id!(ApproverId);
record_id!(
    /// Identifier of a chart-of-accounts entry used by revenue/expense records.
    FinancialAccountId
);
record_id!(FinancialRecordId);

/// Schedulable activity categories that approval rules may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    Service,
    Event,
    Announcement,
}

impl ActivityKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActivityKind::Service => "Service",
            ActivityKind::Event => "Event",
            ActivityKind::Announcement => "Announcement",
        }
    }
}

/// BIPRA sub-division an activity is broadcast to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Bipra {
    General,
    Pkb,
    Pkp,
    Gp,
    Pkr,
    Pklu,
}

impl Bipra {
    pub const ALL: [Bipra; 6] = [
        Bipra::General,
        Bipra::Pkb,
        Bipra::Pkp,
        Bipra::Gp,
        Bipra::Pkr,
        Bipra::Pklu,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Bipra::General => "general",
            Bipra::Pkb => "pkb",
            Bipra::Pkp => "pkp",
            Bipra::Gp => "gp",
            Bipra::Pkr => "pkr",
            Bipra::Pklu => "pklu",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinancialKind {
    Revenue,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
}

/// A person's standing within one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: MembershipId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub birthday: Option<NaiveDate>,
}

/// A named seat. At most one membership holds it at any instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub holder: Option<MembershipId>,
}

/// Administrator-managed policy row mapping conditions to the positions that must approve.
///
/// A rule with neither `activity_kind` nor `financial_kind` is the organization's generic
/// fallback. A `financial_account_id` of `None` on a financial rule means "any account of
/// that kind".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRule {
    pub id: RuleId,
    pub organization_id: OrganizationId,
    pub activity_kind: Option<ActivityKind>,
    pub financial_kind: Option<FinancialKind>,
    pub financial_account_id: Option<FinancialAccountId>,
    pub active: bool,
    pub position_ids: Vec<PositionId>,
}

impl ApprovalRule {
    pub fn is_generic(&self) -> bool {
        self.activity_kind.is_none() && self.financial_kind.is_none()
    }
}

/// Revenue or expense line recorded alongside an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub id: FinancialRecordId,
    pub activity_id: ActivityId,
    pub kind: FinancialKind,
    pub account_id: FinancialAccountId,
    pub amount: i64,
}

/// Financial attributes supplied with an activity creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialDraft {
    pub kind: FinancialKind,
    pub account_id: FinancialAccountId,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub organization_id: OrganizationId,
    pub supervisor_id: MembershipId,
    pub title: String,
    pub kind: ActivityKind,
    pub bipra: Bipra,
    pub date: Option<NaiveDateTime>,
    pub note: Option<String>,
}

/// Columns of an activity row prior to insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub organization_id: OrganizationId,
    pub supervisor_id: MembershipId,
    pub title: String,
    pub kind: ActivityKind,
    pub bipra: Bipra,
    pub date: Option<NaiveDateTime>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApproverStatus {
    Unconfirmed,
    Approved,
    Rejected,
}

impl ApproverStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ApproverStatus::Unconfirmed => "unconfirmed",
            ApproverStatus::Approved => "approved",
            ApproverStatus::Rejected => "rejected",
        }
    }
}

/// Per-activity, per-membership approval obligation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approver {
    pub id: ApproverId,
    pub activity_id: ActivityId,
    pub membership_id: MembershipId,
    pub status: ApproverStatus,
}

/// Input accepted by the activity creation workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateActivityRequest {
    pub organization_id: OrganizationId,
    pub supervisor_id: MembershipId,
    pub title: String,
    pub kind: ActivityKind,
    pub bipra: Bipra,
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub financial: Option<FinancialDraft>,
}

impl CreateActivityRequest {
    pub(crate) fn new_activity(&self) -> NewActivity {
        NewActivity {
            organization_id: self.organization_id,
            supervisor_id: self.supervisor_id,
            title: self.title.clone(),
            kind: self.kind,
            bipra: self.bipra,
            date: self.date,
            note: self.note.clone(),
        }
    }
}
