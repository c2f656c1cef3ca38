//! The decision guard composing classifier, policy, mode, and telemetry.
//!
//! [`SafetyRouterGuard::evaluate`] is the single entry point: it holds no
//! cross-call state of its own and re-reads the mode store on every call,
//! so an operator flipping the mode or guardrails takes effect on the next
//! evaluation with no restart.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::RouterError;

use super::classifier::{RiskClassifier, ToolCall};
use super::mode::{OrchestrationMode, RuntimeModeStore};
use super::policy::{ModelTier, RiskTier, policy_for};
use super::telemetry::EscalationTelemetry;

/// Execution tier a decision routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RouteTarget {
    Local,
    Cloud,
}

/// Whether the call may proceed as routed or was escalated to cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Outcome {
    Allowed,
    Escalated,
}

/// Sign-off steps the caller must obtain before dispatching the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Approval {
    LocalPlan,
    CloudApproval,
    HumanApproval,
}

/// The engine's sole output: one fresh value per [`evaluate`] call.
///
/// `approvals` derives purely from the matched policy rule and is
/// independent of mode; `route` and `outcome` additionally depend on the
/// mode snapshot and the guardrails toggle.
///
/// [`evaluate`]: SafetyRouterGuard::evaluate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardDecision {
    pub risk: RiskTier,
    pub mode: OrchestrationMode,
    pub guardrails_enabled: bool,
    pub route: RouteTarget,
    pub selected_model_tier: ModelTier,
    pub allowed_on_local: bool,
    pub approvals: Vec<Approval>,
    pub triggers: Vec<String>,
    pub reasons: Vec<String>,
    pub outcome: Outcome,
}

/// Admission-control guard for tool calls.
pub struct SafetyRouterGuard {
    classifier: RiskClassifier,
    mode_store: RuntimeModeStore,
    telemetry: Option<EscalationTelemetry>,
}

impl SafetyRouterGuard {
    pub fn new(mode_store: RuntimeModeStore) -> Self {
        Self {
            classifier: RiskClassifier::new(),
            mode_store,
            telemetry: None,
        }
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: RiskClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    #[must_use]
    pub fn with_telemetry(mut self, telemetry: EscalationTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Evaluates one tool call against the current policy and mode.
    ///
    /// Routing starts from the orchestration mode (cloud-first routes to
    /// cloud; local-first and hybrid route locally, picking the larger
    /// local tier for caution risk). With guardrails enabled, a call from
    /// a non-local orchestrator, a tier whose policy forbids local
    /// execution, or privileged-or-worse risk is escalated to cloud; with
    /// guardrails disabled routing follows mode alone.
    ///
    /// A configured telemetry sink records the decision after it is
    /// finalized; an append failure is logged and never fails the call.
    pub fn evaluate(
        &self,
        call: &ToolCall,
        local_orchestrator: bool,
    ) -> Result<GuardDecision, RouterError> {
        let result = self.classifier.classify(call);
        let policy = policy_for(result.risk);
        let status = self.mode_store.get_status()?;

        let mut approvals = Vec::new();
        if policy.requires_local_plan {
            approvals.push(Approval::LocalPlan);
        }
        if policy.requires_cloud_approval {
            approvals.push(Approval::CloudApproval);
        }
        if policy.requires_human_approval {
            approvals.push(Approval::HumanApproval);
        }

        let (mut route, mut selected_model_tier) = match status.mode {
            OrchestrationMode::CloudFirst => (RouteTarget::Cloud, ModelTier::Cloud),
            OrchestrationMode::LocalFirst | OrchestrationMode::Hybrid => (
                RouteTarget::Local,
                if result.risk == RiskTier::Caution {
                    ModelTier::LocalLarge
                } else {
                    ModelTier::LocalSmall
                },
            ),
        };
        let mut outcome = Outcome::Allowed;

        let must_escalate = !local_orchestrator
            || !policy.local_execution_allowed
            || result.risk >= RiskTier::Privileged;
        if status.guardrails_enabled && must_escalate {
            route = RouteTarget::Cloud;
            selected_model_tier = ModelTier::Cloud;
            outcome = Outcome::Escalated;
        }

        let decision = GuardDecision {
            risk: result.risk,
            mode: status.mode,
            guardrails_enabled: status.guardrails_enabled,
            route,
            selected_model_tier,
            allowed_on_local: policy.local_execution_allowed,
            approvals,
            triggers: result.triggers,
            reasons: result.reasons,
            outcome,
        };
        debug!(
            tool = %call.tool,
            risk = %decision.risk,
            route = %decision.route,
            outcome = %decision.outcome,
            "evaluated tool call"
        );

        if let Some(telemetry) = &self.telemetry {
            if let Err(error) = telemetry.log(evaluation_record(call, &decision)) {
                warn!(%error, "failed appending evaluation telemetry record");
            }
        }

        Ok(decision)
    }
}

fn evaluation_record(call: &ToolCall, decision: &GuardDecision) -> Value {
    json!({
        "event": "evaluation",
        "mode": decision.mode,
        "guardrails_enabled": decision.guardrails_enabled,
        "reason": decision.reasons.join("; "),
        "trigger": decision.triggers,
        "selected_model": decision.selected_model_tier,
        "outcome": decision.outcome,
        "risk": decision.risk,
        "tool": call.tool,
        "action": call.action,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn store_in(dir: &TempDir) -> RuntimeModeStore {
        RuntimeModeStore::new(dir.path().join("runtime_mode.json"))
    }

    fn privileged_call() -> ToolCall {
        ToolCall::new("gateway").with_action("gateway restart")
    }

    #[test]
    fn guardrails_escalate_privileged_risk_under_hybrid() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set_guardrails_enabled(true, "test").unwrap();

        let guard = SafetyRouterGuard::new(store);
        let decision = guard.evaluate(&privileged_call(), true).unwrap();

        assert_eq!(decision.risk, RiskTier::Privileged);
        assert_eq!(decision.route, RouteTarget::Cloud);
        assert_eq!(decision.outcome, Outcome::Escalated);
        assert_eq!(decision.selected_model_tier, ModelTier::Cloud);
        assert!(decision.approvals.contains(&Approval::CloudApproval));
        assert!(!decision.allowed_on_local);
    }

    #[test]
    fn cloud_first_routes_safe_calls_to_cloud_regardless_of_guardrails() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set_mode(OrchestrationMode::CloudFirst, "test").unwrap();
        let guard = SafetyRouterGuard::new(store.clone());

        let call = ToolCall::new("weather");
        for enabled in [false, true] {
            store.set_guardrails_enabled(enabled, "test").unwrap();
            let decision = guard.evaluate(&call, true).unwrap();
            assert_eq!(decision.route, RouteTarget::Cloud);
            assert_eq!(decision.selected_model_tier, ModelTier::Cloud);
            assert_eq!(decision.outcome, Outcome::Allowed);
        }
    }

    #[test]
    fn guardrails_off_preserves_legacy_local_routing_for_privileged() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set_mode(OrchestrationMode::LocalFirst, "test").unwrap();

        let guard = SafetyRouterGuard::new(store);
        let decision = guard.evaluate(&privileged_call(), true).unwrap();

        assert_eq!(decision.route, RouteTarget::Local);
        assert_eq!(decision.outcome, Outcome::Allowed);
        assert_eq!(decision.selected_model_tier, ModelTier::LocalSmall);
        // Approvals still derive from policy even when nothing escalates.
        assert_eq!(
            decision.approvals,
            vec![Approval::LocalPlan, Approval::CloudApproval]
        );
    }

    #[test]
    fn caution_risk_selects_the_larger_local_tier() {
        let dir = TempDir::new().unwrap();
        let guard = SafetyRouterGuard::new(store_in(&dir));

        let decision = guard
            .evaluate(&ToolCall::new("linear_update_issue"), true)
            .unwrap();
        assert_eq!(decision.risk, RiskTier::Caution);
        assert_eq!(decision.route, RouteTarget::Local);
        assert_eq!(decision.selected_model_tier, ModelTier::LocalLarge);
    }

    #[test]
    fn non_local_orchestrator_escalates_only_with_guardrails_on() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let guard = SafetyRouterGuard::new(store.clone());
        let call = ToolCall::new("weather");

        let decision = guard.evaluate(&call, false).unwrap();
        assert_eq!(decision.outcome, Outcome::Allowed);
        assert_eq!(decision.route, RouteTarget::Local);

        store.set_guardrails_enabled(true, "test").unwrap();
        let decision = guard.evaluate(&call, false).unwrap();
        assert_eq!(decision.outcome, Outcome::Escalated);
        assert_eq!(decision.route, RouteTarget::Cloud);
    }

    #[test]
    fn destructive_risk_lists_all_approvals_in_order() {
        let dir = TempDir::new().unwrap();
        let guard = SafetyRouterGuard::new(store_in(&dir));

        let call = ToolCall::new("exec").with_payload_entry("command", json!("rm -rf /srv/data"));
        let decision = guard.evaluate(&call, true).unwrap();
        assert_eq!(decision.risk, RiskTier::Destructive);
        assert_eq!(
            decision.approvals,
            vec![Approval::LocalPlan, Approval::CloudApproval, Approval::HumanApproval]
        );
    }

    #[test]
    fn mode_changes_take_effect_on_the_next_evaluation() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let guard = SafetyRouterGuard::new(store.clone());
        let call = ToolCall::new("weather");

        assert_eq!(guard.evaluate(&call, true).unwrap().route, RouteTarget::Local);
        store.set_mode(OrchestrationMode::CloudFirst, "test").unwrap();
        assert_eq!(guard.evaluate(&call, true).unwrap().route, RouteTarget::Cloud);
    }

    #[test]
    fn evaluation_emits_one_telemetry_record() {
        let dir = TempDir::new().unwrap();
        let sink = EscalationTelemetry::new(dir.path().join("telemetry.jsonl"));
        let guard = SafetyRouterGuard::new(store_in(&dir)).with_telemetry(sink.clone());

        let decision = guard.evaluate(&privileged_call(), true).unwrap();

        let raw = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 1);
        let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(record["event"], "evaluation");
        assert_eq!(record["risk"], decision.risk.to_string());
        assert_eq!(record["tool"], "gateway");
        assert!(record["trigger"].is_array());
        assert!(record["ts"].is_string());
    }

    #[test]
    fn telemetry_failure_does_not_fail_the_decision() {
        let dir = TempDir::new().unwrap();
        // The sink path is a directory, so every append fails.
        let sink = EscalationTelemetry::new(dir.path());
        let guard = SafetyRouterGuard::new(store_in(&dir)).with_telemetry(sink);

        let decision = guard.evaluate(&ToolCall::new("weather"), true).unwrap();
        assert_eq!(decision.outcome, Outcome::Allowed);
    }

    #[test]
    fn decision_serializes_with_wire_friendly_names() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set_guardrails_enabled(true, "test").unwrap();
        let guard = SafetyRouterGuard::new(store);

        let decision = guard.evaluate(&privileged_call(), true).unwrap();
        let value = serde_json::to_value(&decision).unwrap();
        assert_eq!(value["risk"], "privileged");
        assert_eq!(value["mode"], "hybrid");
        assert_eq!(value["route"], "cloud");
        assert_eq!(value["outcome"], "escalated");
        assert_eq!(value["selected_model_tier"], "cloud");
        assert_eq!(value["approvals"][0], "local_plan");
    }
}
