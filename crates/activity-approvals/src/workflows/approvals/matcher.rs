use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::domain::{
    ActivityKind, ApprovalRule, FinancialAccountId, FinancialKind, MembershipId, OrganizationId,
    PositionId, RuleId,
};
use super::repository::{RepositoryError, RuleRepository};

/// Named rule queries issued by the matcher.
///
/// Every variant is implicitly restricted to active rules of `organization`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleFilter {
    /// Rules targeting exactly this activity kind.
    ActivityKind {
        organization: OrganizationId,
        kind: ActivityKind,
    },
    /// The organization's fallback rules: no activity kind and no financial kind.
    Generic { organization: OrganizationId },
    /// Rules bound to one specific financial account.
    FinancialAccount {
        organization: OrganizationId,
        account: FinancialAccountId,
    },
    /// Rules for a financial kind that accept any account.
    FinancialKind {
        organization: OrganizationId,
        kind: FinancialKind,
    },
}

impl RuleFilter {
    pub fn organization(&self) -> OrganizationId {
        match self {
            RuleFilter::ActivityKind { organization, .. }
            | RuleFilter::Generic { organization }
            | RuleFilter::FinancialAccount { organization, .. }
            | RuleFilter::FinancialKind { organization, .. } => *organization,
        }
    }

    pub fn matches(&self, rule: &ApprovalRule) -> bool {
        if !rule.active || rule.organization_id != self.organization() {
            return false;
        }

        match self {
            RuleFilter::ActivityKind { kind, .. } => rule.activity_kind == Some(*kind),
            RuleFilter::Generic { .. } => rule.is_generic(),
            RuleFilter::FinancialAccount { account, .. } => {
                rule.financial_account_id == Some(*account)
            }
            RuleFilter::FinancialKind { kind, .. } => {
                rule.financial_kind == Some(*kind) && rule.financial_account_id.is_none()
            }
        }
    }
}

/// Matcher input describing the activity being created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchInput {
    pub organization_id: OrganizationId,
    pub activity_kind: ActivityKind,
    pub supervisor_membership_id: MembershipId,
    #[serde(default)]
    pub financial_account_id: Option<FinancialAccountId>,
    #[serde(default)]
    pub financial_kind: Option<FinancialKind>,
}

/// Rules that applied and the union of their positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleMatch {
    pub matched_rule_ids: Vec<RuleId>,
    pub position_ids: BTreeSet<PositionId>,
}

impl RuleMatch {
    fn absorb(&mut self, rules: Vec<ApprovalRule>) {
        for rule in rules {
            if !self.matched_rule_ids.contains(&rule.id) {
                self.matched_rule_ids.push(rule.id);
            }
            self.position_ids.extend(rule.position_ids);
        }
    }
}

/// Financial rule queries for `input`. Empty when the activity carries no financial kind;
/// the exact-account query is only issued when an account is known.
pub fn financial_filters(input: &MatchInput) -> Vec<RuleFilter> {
    let Some(kind) = input.financial_kind else {
        return Vec::new();
    };

    let organization = input.organization_id;
    let mut filters = Vec::with_capacity(2);
    if let Some(account) = input.financial_account_id {
        filters.push(RuleFilter::FinancialAccount {
            organization,
            account,
        });
    }
    filters.push(RuleFilter::FinancialKind { organization, kind });
    filters
}

/// Selects the approval rules applicable to an activity.
pub struct RuleMatcher<'a, R: ?Sized> {
    rules: &'a R,
}

impl<'a, R> RuleMatcher<'a, R>
where
    R: RuleRepository + ?Sized,
{
    pub fn new(rules: &'a R) -> Self {
        Self { rules }
    }

    pub fn match_rules(&self, input: &MatchInput) -> Result<RuleMatch, RepositoryError> {
        let organization = input.organization_id;
        let mut matched = RuleMatch::default();

        let typed = self.rules.find_rules(&RuleFilter::ActivityKind {
            organization,
            kind: input.activity_kind,
        })?;

        if typed.is_empty() {
            let generic = self.rules.find_rules(&RuleFilter::Generic { organization })?;
            matched.absorb(generic);
        } else {
            matched.absorb(typed);
        }

        for filter in financial_filters(input) {
            let rules = self.rules.find_rules(&filter)?;
            matched.absorb(rules);
        }

        tracing::debug!(
            organization = %organization,
            kind = ?input.activity_kind,
            rules = matched.matched_rule_ids.len(),
            positions = matched.position_ids.len(),
            "matched approval rules"
        );

        Ok(matched)
    }
}
