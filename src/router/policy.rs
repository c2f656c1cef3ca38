//! Risk tiers and the static policy matrix.
//!
//! The matrix is total by construction: [`policy_for`] is an exhaustive
//! match over [`RiskTier`], so adding a tier without a rule is a compile
//! error rather than a runtime lookup miss.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Risk tier of a tool call, ordered from least to most severe.
///
/// The derived ordering is load-bearing: escalation checks compare tiers
/// with `>=`, so variants must stay declared in ascending severity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskTier {
    Safe,
    Caution,
    Privileged,
    Destructive,
}

impl RiskTier {
    /// All tiers in ascending severity.
    pub const ALL: [RiskTier; 4] = [
        RiskTier::Safe,
        RiskTier::Caution,
        RiskTier::Privileged,
        RiskTier::Destructive,
    ];
}

/// Model tier a call may be routed to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ModelTier {
    LocalSmall,
    LocalLarge,
    Cloud,
}

/// Execution constraints attached to one risk tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PolicyRule {
    pub local_execution_allowed: bool,
    pub requires_cloud_approval: bool,
    pub requires_human_approval: bool,
    pub requires_local_plan: bool,
    pub allowed_model_tiers: &'static [ModelTier],
}

const SAFE_RULE: PolicyRule = PolicyRule {
    local_execution_allowed: true,
    requires_cloud_approval: false,
    requires_human_approval: false,
    requires_local_plan: false,
    allowed_model_tiers: &[ModelTier::LocalSmall, ModelTier::LocalLarge, ModelTier::Cloud],
};

const CAUTION_RULE: PolicyRule = PolicyRule {
    local_execution_allowed: true,
    requires_cloud_approval: false,
    requires_human_approval: false,
    requires_local_plan: false,
    allowed_model_tiers: &[ModelTier::LocalLarge, ModelTier::Cloud],
};

const PRIVILEGED_RULE: PolicyRule = PolicyRule {
    local_execution_allowed: false,
    requires_cloud_approval: true,
    requires_human_approval: false,
    requires_local_plan: true,
    allowed_model_tiers: &[ModelTier::Cloud],
};

const DESTRUCTIVE_RULE: PolicyRule = PolicyRule {
    local_execution_allowed: false,
    requires_cloud_approval: true,
    requires_human_approval: true,
    requires_local_plan: true,
    allowed_model_tiers: &[ModelTier::Cloud],
};

/// Returns the rule for `tier`. Total over all tiers.
pub fn policy_for(tier: RiskTier) -> &'static PolicyRule {
    match tier {
        RiskTier::Safe => &SAFE_RULE,
        RiskTier::Caution => &CAUTION_RULE,
        RiskTier::Privileged => &PRIVILEGED_RULE,
        RiskTier::Destructive => &DESTRUCTIVE_RULE,
    }
}

/// The full matrix keyed by tier, in ascending severity order.
pub fn snapshot() -> BTreeMap<RiskTier, &'static PolicyRule> {
    RiskTier::ALL
        .into_iter()
        .map(|tier| (tier, policy_for(tier)))
        .collect()
}
