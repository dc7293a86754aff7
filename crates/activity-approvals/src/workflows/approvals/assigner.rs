use std::collections::BTreeMap;

use super::domain::{ActivityId, Approver, Membership, OrganizationId};
use super::matcher::RuleMatch;
use super::repository::{ActivityTransaction, DirectoryRepository, RepositoryError};

/// Turns matched positions into concrete approver memberships.
pub struct ApproverAssigner<'a, D: ?Sized> {
    directory: &'a D,
}

impl<'a, D> ApproverAssigner<'a, D>
where
    D: DirectoryRepository + ?Sized,
{
    pub fn new(directory: &'a D) -> Self {
        Self { directory }
    }

    /// Memberships of `organization` seated in any matched position, ordered by id.
    ///
    /// The supervisor is not filtered out: self-approval is allowed.
    pub fn resolve(
        &self,
        organization: OrganizationId,
        matched: &RuleMatch,
    ) -> Result<Vec<Membership>, RepositoryError> {
        if matched.position_ids.is_empty() {
            return Ok(Vec::new());
        }

        let occupants = self
            .directory
            .occupants(organization, &matched.position_ids)?;

        let unique: BTreeMap<_, _> = occupants
            .into_iter()
            .filter(|membership| membership.organization_id == organization)
            .map(|membership| (membership.id, membership))
            .collect();

        Ok(unique.into_values().collect())
    }
}

/// Stages one UNCONFIRMED approver per membership inside `tx`.
///
/// A repeated membership surfaces as `DuplicateApprover` and the caller is expected to
/// abandon the transaction.
pub fn assign_approvers(
    tx: &mut (dyn ActivityTransaction + '_),
    activity: ActivityId,
    memberships: &[Membership],
) -> Result<Vec<Approver>, RepositoryError> {
    memberships
        .iter()
        .map(|membership| tx.insert_approver(activity, membership.id))
        .collect()
}
