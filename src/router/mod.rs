//! Safety router core: classification, policy, runtime mode, guard,
//! and the escalation audit trail.

pub mod classifier;
pub mod guard;
pub mod mode;
pub mod patterns;
pub mod policy;
pub mod telemetry;

pub use classifier::{ClassificationResult, RiskClassifier, ToolCall};
pub use guard::{Approval, GuardDecision, Outcome, RouteTarget, SafetyRouterGuard};
pub use mode::{ModeStatus, OrchestrationMode, RuntimeModeStore};
pub use patterns::{RULE_TABLE_VERSION, RuleTables};
pub use policy::{ModelTier, PolicyRule, RiskTier, policy_for, snapshot};
pub use telemetry::EscalationTelemetry;
