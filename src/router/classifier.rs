//! Risk classification for tool calls.
//!
//! [`RiskClassifier::classify`] is pure and total: it never fails, never
//! touches I/O, and the same call always yields the same result. The
//! evaluation order is a contract. Elevated exec and destructive command
//! patterns are unconditional hard stops; gateway lifecycle and sensitive
//! keyword matches are soft signals that elevate to privileged only.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::patterns::RuleTables;
use super::policy::RiskTier;

/// One requested tool invocation, as submitted by an orchestrator.
///
/// Every field except `tool` is optional on the wire; absent fields
/// default to empty so batch input with sparse descriptors still parses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolCall {
    pub tool: String,
    pub action: String,
    pub intent: String,
    pub payload: Map<String, Value>,
}

impl ToolCall {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    #[must_use]
    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = intent.into();
        self
    }

    #[must_use]
    pub fn with_payload_entry(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }
}

/// Outcome of classifying one tool call.
///
/// `triggers` are stable machine-readable match identifiers; `reasons`
/// are the matching human-readable explanations and are never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub risk: RiskTier,
    pub triggers: Vec<String>,
    pub reasons: Vec<String>,
}

/// Classifies tool calls into risk tiers using compiled rule tables.
#[derive(Debug)]
pub struct RiskClassifier {
    gateway_actions: Vec<String>,
    gateway_commands: Vec<(String, Regex)>,
    destructive_commands: Vec<(String, Regex)>,
    sensitive_keyword: Option<Regex>,
    external_write_tools: Vec<String>,
}

impl RiskClassifier {
    /// Builds a classifier over the built-in rule tables.
    pub fn new() -> Self {
        Self::with_tables(&RuleTables::default())
    }

    /// Builds a classifier over custom rule tables. Patterns that fail to
    /// compile are skipped with a warning rather than failing the build.
    pub fn with_tables(tables: &RuleTables) -> Self {
        Self {
            gateway_actions: tables
                .gateway_actions
                .iter()
                .map(|action| action.trim().to_lowercase())
                .collect(),
            gateway_commands: compile_patterns(&tables.gateway_command_patterns),
            destructive_commands: compile_patterns(&tables.destructive_command_patterns),
            sensitive_keyword: compile_pattern(&tables.sensitive_keyword_pattern),
            external_write_tools: tables.external_write_tools.clone(),
        }
    }

    /// Classifies one call. First match wins; later checks never run once
    /// an earlier one has returned.
    ///
    /// 1. `exec` with a true `elevated` payload flag is destructive.
    /// 2. A gateway-sensitive action records a soft trigger.
    /// 3. A gateway lifecycle invocation in `payload.command` records a
    ///    soft trigger (first matching pattern only).
    /// 4. A destructive pattern in `payload.command` is destructive,
    ///    keeping any soft triggers already recorded.
    /// 5. A sensitive keyword in intent/command/action records a soft
    ///    trigger.
    /// 6. Any soft trigger elevates to privileged.
    /// 7. An external-write tool is caution.
    /// 8. Everything else is safe.
    pub fn classify(&self, call: &ToolCall) -> ClassificationResult {
        let action = call.action.trim().to_lowercase();
        let intent = call.intent.trim();
        let command = payload_command(&call.payload);

        let mut triggers = Vec::new();
        let mut reasons = Vec::new();

        if call.tool == "exec" && payload_flag(&call.payload, "elevated") {
            triggers.push("exec.elevated".to_string());
            reasons.push("Elevated shell execution requested".to_string());
            return ClassificationResult {
                risk: RiskTier::Destructive,
                triggers,
                reasons,
            };
        }

        if !action.is_empty() && self.gateway_actions.iter().any(|known| *known == action) {
            triggers.push(format!("gateway.action:{action}"));
            reasons.push("Gateway configuration/update lifecycle action".to_string());
        }

        if let Some((pattern, _)) = self
            .gateway_commands
            .iter()
            .find(|(_, regex)| regex.is_match(&command))
        {
            triggers.push(format!("gateway.command:{pattern}"));
            reasons.push("Gateway lifecycle command detected".to_string());
        }

        if let Some((pattern, _)) = self
            .destructive_commands
            .iter()
            .find(|(_, regex)| regex.is_match(&command))
        {
            triggers.push(format!("destructive_pattern:{pattern}"));
            reasons.push("Potentially destructive shell command pattern".to_string());
            return ClassificationResult {
                risk: RiskTier::Destructive,
                triggers,
                reasons,
            };
        }

        let blob = [intent, command.as_str(), action.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(keyword) = &self.sensitive_keyword {
            if keyword.is_match(&blob) {
                triggers.push("sensitive_keyword".to_string());
                reasons.push(
                    "Intent includes prod/auth/billing/security sensitive scope".to_string(),
                );
            }
        }

        if !triggers.is_empty() {
            return ClassificationResult {
                risk: RiskTier::Privileged,
                triggers,
                reasons,
            };
        }

        if self.external_write_tools.iter().any(|tool| *tool == call.tool) {
            return ClassificationResult {
                risk: RiskTier::Caution,
                triggers: vec!["tool.write".to_string()],
                reasons: vec!["External system write operation".to_string()],
            };
        }

        ClassificationResult {
            risk: RiskTier::Safe,
            triggers,
            reasons: vec!["No sensitive triggers matched".to_string()],
        }
    }
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn compile_pattern(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(regex) => Some(regex),
        Err(error) => {
            warn!(pattern, %error, "skipping unparseable classification pattern");
            None
        }
    }
}

fn compile_patterns(patterns: &[String]) -> Vec<(String, Regex)> {
    patterns
        .iter()
        .filter_map(|pattern| compile_pattern(pattern).map(|regex| (pattern.clone(), regex)))
        .collect()
}

/// Renders `payload.command` to text. Strings pass through; any other
/// value is rendered as JSON so commands hidden in structured payloads
/// still hit the pattern tables.
fn payload_command(payload: &Map<String, Value>) -> String {
    match payload.get("command") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(command)) => command.clone(),
        Some(other) => other.to_string(),
    }
}

fn payload_flag(payload: &Map<String, Value>, key: &str) -> bool {
    payload.get(key).and_then(Value::as_bool).unwrap_or(false)
}
