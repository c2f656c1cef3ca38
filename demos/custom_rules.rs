//! Example: Embedding the guard with custom classification rules
//!
//! The built-in rule tables cover shell and gateway hazards; a deployment
//! can extend them without forking the classifier by building a
//! `RiskClassifier` over its own `RuleTables`.
//!
//! Run: `cargo run --example custom_rules`

use anyhow::Result;
use serde_json::json;
use tempfile::TempDir;

use clawguard::{
    RiskClassifier, RuleTables, RuntimeModeStore, SafetyRouterGuard, ToolCall,
};

fn main() -> Result<()> {
    // Extend the built-in tables with site-specific hazards.
    let mut tables = RuleTables::default();
    tables
        .destructive_command_patterns
        .push(r"\bvault\s+secrets\s+disable\b".to_string());
    tables.external_write_tools.push("jira_update_ticket".to_string());

    // State lives in a throwaway directory for the demo; a real embedding
    // points this at its runtime directory.
    let dir = TempDir::new()?;
    let store = RuntimeModeStore::new(dir.path().join("runtime_mode.json"));
    store.set_guardrails_enabled(true, "demo")?;

    let guard = SafetyRouterGuard::new(store)
        .with_classifier(RiskClassifier::with_tables(&tables));

    let calls = [
        ToolCall::new("weather").with_intent("check the forecast"),
        ToolCall::new("jira_update_ticket").with_action("transition"),
        ToolCall::new("exec")
            .with_payload_entry("command", json!("vault secrets disable kv/")),
    ];

    for call in &calls {
        let decision = guard.evaluate(call, true)?;
        println!("{} -> {}", call.tool, serde_json::to_string_pretty(&decision)?);
    }

    Ok(())
}
