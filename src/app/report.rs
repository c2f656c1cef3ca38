//! Dry-run batch aggregation and Markdown report rendering.

use std::collections::BTreeMap;

use clawguard::{GuardDecision, Outcome, OrchestrationMode, RiskTier, RouteTarget, ToolCall};

struct TaskRow {
    index: usize,
    tool: String,
    action: String,
    risk: RiskTier,
    route: RouteTarget,
    outcome: Outcome,
    triggers: Vec<String>,
}

/// Aggregated results of one dry-run batch.
pub struct DryRunSummary {
    mode: OrchestrationMode,
    guardrails_enabled: bool,
    tier_counts: BTreeMap<RiskTier, usize>,
    routed_local: usize,
    routed_cloud: usize,
    escalated: usize,
    rows: Vec<TaskRow>,
}

impl DryRunSummary {
    pub fn new(mode: OrchestrationMode, guardrails_enabled: bool) -> Self {
        Self {
            mode,
            guardrails_enabled,
            tier_counts: BTreeMap::new(),
            routed_local: 0,
            routed_cloud: 0,
            escalated: 0,
            rows: Vec::new(),
        }
    }

    /// Folds one decision into the aggregate counts and the task table.
    pub fn record(&mut self, call: &ToolCall, decision: &GuardDecision) {
        *self.tier_counts.entry(decision.risk).or_insert(0) += 1;
        match decision.route {
            RouteTarget::Local => self.routed_local += 1,
            RouteTarget::Cloud => self.routed_cloud += 1,
        }
        if decision.outcome == Outcome::Escalated {
            self.escalated += 1;
        }
        self.rows.push(TaskRow {
            index: self.rows.len() + 1,
            tool: call.tool.clone(),
            action: call.action.clone(),
            risk: decision.risk,
            route: decision.route,
            outcome: decision.outcome,
            triggers: decision.triggers.clone(),
        });
    }

    fn tier_count(&self, tier: RiskTier) -> usize {
        self.tier_counts.get(&tier).copied().unwrap_or(0)
    }
}

/// Renders the Markdown report for one dry-run batch.
pub fn render(summary: &DryRunSummary) -> String {
    let mut lines = vec![
        "# Dry Run Report".to_string(),
        String::new(),
        format!("Sample size: **{}**", summary.rows.len()),
        format!("Mode: **{}**", summary.mode),
        format!("Guardrails enabled: **{}**", summary.guardrails_enabled),
        String::new(),
        "## Aggregate results".to_string(),
        String::new(),
        format!("- Safe: {}", summary.tier_count(RiskTier::Safe)),
        format!("- Caution: {}", summary.tier_count(RiskTier::Caution)),
        format!("- Privileged: {}", summary.tier_count(RiskTier::Privileged)),
        format!("- Destructive: {}", summary.tier_count(RiskTier::Destructive)),
        format!("- Routed local: {}", summary.routed_local),
        format!("- Routed cloud: {}", summary.routed_cloud),
        format!("- Escalated: {}", summary.escalated),
        String::new(),
        "## Per-task decisions".to_string(),
        String::new(),
        "| # | Tool | Action | Risk | Route | Outcome | Triggers |".to_string(),
        "|---|------|--------|------|-------|---------|----------|".to_string(),
    ];

    for row in &summary.rows {
        let triggers = if row.triggers.is_empty() {
            "-".to_string()
        } else {
            row.triggers.join(", ")
        };
        lines.push(format!(
            "| {} | `{}` | `{}` | {} | {} | {} | {} |",
            row.index, row.tool, row.action, row.risk, row.route, row.outcome, triggers
        ));
    }

    lines.extend([
        String::new(),
        "## KPI trial (2 weeks)".to_string(),
        String::new(),
        "Track daily:".to_string(),
        "- Escalation rate = cloud_routed / total_tool_calls".to_string(),
        "- False positive rate = manual_overrides_allow / escalations".to_string(),
        "- Human approval volume for destructive ops".to_string(),
        "- Mean approval latency (cloud + human)".to_string(),
        "- Policy coverage = classified_calls / total_tool_calls".to_string(),
        String::new(),
    ]);

    lines.join("\n")
}
