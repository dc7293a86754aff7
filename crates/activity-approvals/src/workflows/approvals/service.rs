use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::assigner::{assign_approvers, ApproverAssigner};
use super::domain::{
    Activity, ActivityId, Approver, ApproverId, ApproverStatus, CreateActivityRequest,
    FinancialRecord, MembershipId, OrganizationId, RuleId,
};
use super::matcher::{MatchInput, RuleMatcher};
use super::repository::{ApprovalStore, RepositoryError};
use crate::workflows::notifications::sink::{
    ActivityCreatedFanout, FanoutTask, NotificationSink, StatusChangeFanout,
};

/// Matcher contract exposed to callers: the rules that applied and who must approve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproverMatch {
    pub matched_rule_ids: Vec<RuleId>,
    pub membership_ids: Vec<MembershipId>,
}

/// Committed result of an activity creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityCreated {
    pub activity: Activity,
    pub financial_record: Option<FinancialRecord>,
    pub approvers: Vec<Approver>,
    pub matched_rule_ids: Vec<RuleId>,
}

/// Activity with its linked records, as currently stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityDetails {
    pub activity: Activity,
    pub financial_record: Option<FinancialRecord>,
    pub approvers: Vec<Approver>,
}

/// Error raised by the approval service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApprovalError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("membership {membership_id} is already an approver of activity {activity_id}")]
    DuplicateApprover {
        activity_id: ActivityId,
        membership_id: MembershipId,
    },
    #[error("approver status can only move to APPROVED or REJECTED")]
    InvalidTransition,
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ApprovalError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => ApprovalError::NotFound("record".to_string()),
            RepositoryError::DuplicateApprover {
                activity_id,
                membership_id,
            } => ApprovalError::DuplicateApprover {
                activity_id,
                membership_id,
            },
            other => ApprovalError::Repository(other),
        }
    }
}

/// Service composing the rule matcher, approver assigner and the notification hand-off.
pub struct ActivityApprovalService<S, K> {
    store: Arc<S>,
    sink: Arc<K>,
}

impl<S, K> ActivityApprovalService<S, K>
where
    S: ApprovalStore + 'static,
    K: NotificationSink + 'static,
{
    pub fn new(store: Arc<S>, sink: Arc<K>) -> Self {
        Self { store, sink }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Rules and memberships that would have to approve an activity described by `input`.
    pub fn match_approvers(&self, input: &MatchInput) -> Result<ApproverMatch, ApprovalError> {
        self.require_organization(input.organization_id)?;

        let matched = RuleMatcher::new(self.store.as_ref()).match_rules(input)?;
        let memberships =
            ApproverAssigner::new(self.store.as_ref()).resolve(input.organization_id, &matched)?;

        Ok(ApproverMatch {
            matched_rule_ids: matched.matched_rule_ids,
            membership_ids: memberships.into_iter().map(|member| member.id).collect(),
        })
    }

    /// Persist the activity, its financial record and its approvers atomically, then hand
    /// the creation fan-out to the sink.
    pub fn create_activity(
        &self,
        request: CreateActivityRequest,
    ) -> Result<ActivityCreated, ApprovalError> {
        let organization = request.organization_id;
        self.require_organization(organization)?;
        self.require_member(organization, request.supervisor_id)?;

        let input = MatchInput {
            organization_id: organization,
            activity_kind: request.kind,
            supervisor_membership_id: request.supervisor_id,
            financial_account_id: request.financial.as_ref().map(|draft| draft.account_id),
            financial_kind: request.financial.as_ref().map(|draft| draft.kind),
        };
        let matched = RuleMatcher::new(self.store.as_ref()).match_rules(&input)?;
        let memberships =
            ApproverAssigner::new(self.store.as_ref()).resolve(organization, &matched)?;

        let mut tx = self.store.begin()?;
        let activity = tx.insert_activity(request.new_activity())?;
        let financial_record = match &request.financial {
            Some(draft) => Some(tx.insert_financial_record(activity.id, draft)?),
            None => None,
        };
        let approvers = assign_approvers(tx.as_mut(), activity.id, &memberships)?;
        tx.commit()?;

        info!(
            activity_id = %activity.id,
            organization = %organization,
            approvers = approvers.len(),
            rules = matched.matched_rule_ids.len(),
            "activity created"
        );

        self.sink
            .submit(FanoutTask::ActivityCreated(ActivityCreatedFanout {
                activity: activity.clone(),
                approvers: approvers.clone(),
            }));

        Ok(ActivityCreated {
            activity,
            financial_record,
            approvers,
            matched_rule_ids: matched.matched_rule_ids,
        })
    }

    /// Record an approver's decision (last write wins) and hand the status fan-out to the
    /// sink.
    pub fn update_approver_status(
        &self,
        approver_id: ApproverId,
        status: ApproverStatus,
    ) -> Result<Approver, ApprovalError> {
        if status == ApproverStatus::Unconfirmed {
            return Err(ApprovalError::InvalidTransition);
        }

        let updated = self
            .store
            .set_approver_status(approver_id, status)
            .map_err(|err| match err {
                RepositoryError::NotFound => {
                    ApprovalError::NotFound(format!("approver {approver_id}"))
                }
                other => other.into(),
            })?;

        info!(
            approver_id = %updated.id,
            activity_id = %updated.activity_id,
            status = updated.status.label(),
            "approver status updated"
        );

        match self.status_change_snapshot(&updated) {
            Ok(Some(change)) => self.sink.submit(FanoutTask::StatusChanged(change)),
            Ok(None) => warn!(
                activity_id = %updated.activity_id,
                "activity missing for approver; status fan-out skipped"
            ),
            Err(err) => warn!(
                activity_id = %updated.activity_id,
                error = %err,
                "could not read approvers; status fan-out skipped"
            ),
        }

        Ok(updated)
    }

    pub fn activity(&self, id: ActivityId) -> Result<ActivityDetails, ApprovalError> {
        let activity = self
            .store
            .activity(id)?
            .ok_or_else(|| ApprovalError::NotFound(format!("activity {id}")))?;
        let financial_record = self.store.financial_record(id)?;
        let approvers = self.store.approvers_for(id)?;

        Ok(ActivityDetails {
            activity,
            financial_record,
            approvers,
        })
    }

    fn status_change_snapshot(
        &self,
        updated: &Approver,
    ) -> Result<Option<StatusChangeFanout>, RepositoryError> {
        let Some(activity) = self.store.activity(updated.activity_id)? else {
            return Ok(None);
        };
        let approvers = self.store.approvers_for(activity.id)?;
        let approver_name = self
            .store
            .membership(updated.membership_id)?
            .map(|member| member.name)
            .unwrap_or_else(|| format!("Member {}", updated.membership_id));

        Ok(Some(StatusChangeFanout {
            activity,
            approver: updated.clone(),
            approver_name,
            approvers,
        }))
    }

    fn require_organization(&self, id: OrganizationId) -> Result<(), ApprovalError> {
        match self.store.organization(id)? {
            Some(_) => Ok(()),
            None => Err(ApprovalError::NotFound(format!("organization {id}"))),
        }
    }

    fn require_member(
        &self,
        organization: OrganizationId,
        membership: MembershipId,
    ) -> Result<(), ApprovalError> {
        match self.store.membership(membership)? {
            Some(member) if member.organization_id == organization => Ok(()),
            _ => Err(ApprovalError::NotFound(format!(
                "membership {membership} in organization {organization}"
            ))),
        }
    }
}
