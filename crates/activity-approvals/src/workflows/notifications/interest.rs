//! Canonical interest (topic) names.
//!
//! Interests double as push-subscription channels and as the `recipient` column of persisted
//! notifications, so the rendered strings must stay byte-for-byte stable.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::workflows::approvals::domain::{Bipra, MembershipId, OrganizationId};

/// Broadcast interest every installation subscribes to.
pub const GLOBAL_INTEREST: &str = "global";

/// Identifier of a news column published by an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnId(pub i64);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Interest {
    Global,
    Organization(OrganizationId),
    Group {
        organization: OrganizationId,
        group: String,
    },
    Membership(MembershipId),
    MembershipBirthday(MembershipId),
    Column {
        organization: OrganizationId,
        column: ColumnId,
    },
    ColumnGroup {
        organization: OrganizationId,
        column: ColumnId,
        group: String,
    },
}

impl Interest {
    pub fn group(organization: OrganizationId, group: &str) -> Self {
        Interest::Group {
            organization,
            group: group.trim().to_uppercase(),
        }
    }

    pub fn bipra(organization: OrganizationId, bipra: Bipra) -> Self {
        Self::group(organization, bipra.code())
    }

    pub fn column_group(organization: OrganizationId, column: ColumnId, group: &str) -> Self {
        Interest::ColumnGroup {
            organization,
            column,
            group: group.trim().to_uppercase(),
        }
    }
}

impl fmt::Display for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interest::Global => f.write_str(GLOBAL_INTEREST),
            Interest::Organization(organization) => write!(f, "organization.{}", organization.0),
            Interest::Group {
                organization,
                group,
            } => write!(f, "organization.{}_group.{}", organization.0, group),
            Interest::Membership(membership) => write!(f, "membership.{}", membership.0),
            Interest::MembershipBirthday(membership) => {
                write!(f, "membership.{}.birthday", membership.0)
            }
            Interest::Column {
                organization,
                column,
            } => write!(f, "organization.{}_column.{}", organization.0, column.0),
            Interest::ColumnGroup {
                organization,
                column,
                group,
            } => write!(
                f,
                "organization.{}_column.{}_group.{}",
                organization.0, column.0, group
            ),
        }
    }
}

impl From<Interest> for String {
    fn from(value: Interest) -> Self {
        value.to_string()
    }
}

pub fn group_interest(organization: OrganizationId, group: &str) -> String {
    Interest::group(organization, group).to_string()
}

pub fn membership_interest(membership: MembershipId) -> String {
    Interest::Membership(membership).to_string()
}

pub fn membership_birthday_interest(membership: MembershipId) -> String {
    Interest::MembershipBirthday(membership).to_string()
}

pub fn organization_interest(organization: OrganizationId) -> String {
    Interest::Organization(organization).to_string()
}

pub fn column_interest(organization: OrganizationId, column: ColumnId) -> String {
    Interest::Column {
        organization,
        column,
    }
    .to_string()
}

pub fn column_group_interest(organization: OrganizationId, column: ColumnId, group: &str) -> String {
    Interest::column_group(organization, column, group).to_string()
}
