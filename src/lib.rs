#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::struct_excessive_bools
)]

//! Risk-aware admission control for agent tool calls.
//!
//! Every requested action is classified into a risk tier, matched against
//! a static policy matrix, and routed according to the persisted runtime
//! mode; escalations and mode changes land in an append-only audit trail.
//! The engine only produces decisions and required approvals; executing
//! tool calls and collecting those approvals stay with the caller.

pub mod config;
pub mod error;
pub mod router;

pub use config::RouterConfig;
pub use error::{ConfigError, RouterError, StoreError, TelemetryError};
pub use router::{
    Approval, ClassificationResult, EscalationTelemetry, GuardDecision, ModeStatus, ModelTier,
    Outcome, OrchestrationMode, PolicyRule, RiskClassifier, RiskTier, RouteTarget, RuleTables,
    RuntimeModeStore, SafetyRouterGuard, ToolCall,
};
