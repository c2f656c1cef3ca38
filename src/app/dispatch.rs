use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use clawguard::router::snapshot;
use clawguard::{
    EscalationTelemetry, GuardDecision, ModeStatus, RouterConfig, RuntimeModeStore,
    SafetyRouterGuard, ToolCall,
};
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::app::report::{self, DryRunSummary};
use crate::cli::commands::{Cli, Commands, DryRunArgs, EvaluateArgs, ModeCommands};

/// Routes a parsed command line to its handler.
///
/// Path precedence is flag, then config file, then built-in default. The
/// telemetry sink is dropped entirely when the config disables it, so no
/// handler below needs its own enabled check.
pub fn dispatch(cli: Cli) -> Result<()> {
    let config = RouterConfig::load(cli.config.as_deref())?;
    let state_file = cli
        .state_file
        .clone()
        .unwrap_or_else(|| config.storage.mode_state_path.clone());
    let telemetry = resolve_telemetry(cli.telemetry.as_deref(), &config);
    let store = RuntimeModeStore::new(state_file);

    match cli.command {
        Commands::Evaluate(args) => run_evaluate(store, telemetry, args),
        Commands::Mode { mode_command } => run_mode(&store, telemetry.as_ref(), mode_command),
        Commands::DryRun(args) => run_dry_run(store, telemetry.as_ref(), args),
        Commands::Policy => run_policy(),
    }
}

fn resolve_telemetry(flag: Option<&Path>, config: &RouterConfig) -> Option<EscalationTelemetry> {
    match flag {
        Some(path) => Some(EscalationTelemetry::new(path)),
        None if config.telemetry.enabled => Some(EscalationTelemetry::new(&config.telemetry.path)),
        None => None,
    }
}

fn run_evaluate(
    store: RuntimeModeStore,
    telemetry: Option<EscalationTelemetry>,
    args: EvaluateArgs,
) -> Result<()> {
    let payload = parse_payload(&args.payload)?;

    if let Some(mode) = args.mode {
        store.set_mode(mode, "guard-eval")?;
    }
    if let Some(guardrails) = args.guardrails {
        store.set_guardrails_enabled(guardrails.enabled(), "guard-eval")?;
    }

    let mut call = ToolCall::new(args.tool)
        .with_action(args.action)
        .with_intent(args.intent);
    call.payload = payload;

    let mut guard = SafetyRouterGuard::new(store);
    if let Some(telemetry) = telemetry {
        guard = guard.with_telemetry(telemetry);
    }

    let decision = guard.evaluate(&call, !args.cloud_orchestrator)?;
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

fn run_mode(
    store: &RuntimeModeStore,
    telemetry: Option<&EscalationTelemetry>,
    command: ModeCommands,
) -> Result<()> {
    match command {
        ModeCommands::Status => {
            let status = store.get_status()?;
            print_status(&status)
        }
        ModeCommands::SetMode { mode, actor } => {
            let before = store.get_status()?;
            let after = store.set_mode(mode, &actor)?;
            log_best_effort(
                telemetry,
                json!({
                    "event": "mode_change",
                    "actor": actor,
                    "before_mode": before.mode,
                    "after_mode": after.mode,
                    "guardrails_enabled": after.guardrails_enabled,
                    "outcome": "applied",
                }),
            );
            print_status(&after)
        }
        ModeCommands::SetGuardrails { enabled, actor } => {
            let before = store.get_status()?;
            let after = store.set_guardrails_enabled(enabled.enabled(), &actor)?;
            log_best_effort(
                telemetry,
                json!({
                    "event": "guardrails_toggle",
                    "actor": actor,
                    "before_enabled": before.guardrails_enabled,
                    "after_enabled": after.guardrails_enabled,
                    "mode": after.mode,
                    "outcome": "applied",
                }),
            );
            print_status(&after)
        }
    }
}

fn run_dry_run(
    store: RuntimeModeStore,
    telemetry: Option<&EscalationTelemetry>,
    args: DryRunArgs,
) -> Result<()> {
    // Validate the sample before touching the mode record; a rejected run
    // must leave the persisted state exactly as it found it.
    let tasks = load_tasks(&args.input)?;

    if let Some(mode) = args.mode {
        store.set_mode(mode, "dry-run")?;
    }
    if let Some(guardrails) = args.guardrails {
        store.set_guardrails_enabled(guardrails.enabled(), "dry-run")?;
    }

    let status = store.get_status()?;
    let guard = SafetyRouterGuard::new(store);

    let mut summary = DryRunSummary::new(status.mode, status.guardrails_enabled);
    for (index, call) in tasks.iter().enumerate() {
        let decision = guard.evaluate(call, true)?;
        log_best_effort(telemetry, dry_run_record(index + 1, call, &decision));
        summary.record(call, &decision);
    }

    let rendered = report::render(&summary);
    if let Some(parent) = args.report.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed creating report directory {}", parent.display()))?;
        }
    }
    fs::write(&args.report, rendered)
        .with_context(|| format!("failed writing report {}", args.report.display()))?;
    println!("Wrote report: {}", args.report.display());
    Ok(())
}

fn run_policy() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&snapshot())?);
    Ok(())
}

fn parse_payload(raw: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(raw).context("payload is not valid JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        _ => bail!("payload must be a JSON object"),
    }
}

fn load_tasks(path: &Path) -> Result<Vec<ToolCall>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading task sample {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("task sample {} is not valid JSON", path.display()))?;
    if !value.is_array() {
        bail!("task sample file must be a JSON array");
    }
    serde_json::from_value(value).context("failed decoding task descriptors")
}

fn dry_run_record(task_index: usize, call: &ToolCall, decision: &GuardDecision) -> Value {
    json!({
        "event": "dry_run",
        "task_index": task_index,
        "tool": call.tool,
        "action": call.action,
        "reason": decision.reasons.join("; "),
        "trigger": decision.triggers,
        "selected_model": decision.selected_model_tier,
        "outcome": decision.outcome,
        "risk": decision.risk,
    })
}

fn log_best_effort(telemetry: Option<&EscalationTelemetry>, record: Value) {
    if let Some(sink) = telemetry {
        if let Err(error) = sink.log(record) {
            warn!(%error, "failed appending telemetry record");
        }
    }
}

fn print_status(status: &ModeStatus) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(status)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn payload_must_be_a_json_object() {
        assert!(parse_payload("{}").unwrap().is_empty());
        let payload = parse_payload(r#"{"elevated": true}"#).unwrap();
        assert_eq!(payload.get("elevated"), Some(&Value::Bool(true)));

        assert!(parse_payload("[1, 2]").is_err());
        assert!(parse_payload("not json").is_err());
    }

    #[test]
    fn task_sample_must_be_a_json_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");

        std::fs::write(&path, r#"{"tool": "exec"}"#).unwrap();
        let error = load_tasks(&path).unwrap_err();
        assert!(error.to_string().contains("JSON array"));

        std::fs::write(&path, r#"[{"tool": "exec"}, {}]"#).unwrap();
        let tasks = load_tasks(&path).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].tool, "exec");
        assert!(tasks[1].tool.is_empty());
    }

    #[test]
    fn telemetry_resolution_honors_flag_and_config() {
        let mut config = RouterConfig::default();
        assert!(resolve_telemetry(None, &config).is_some());

        config.telemetry.enabled = false;
        assert!(resolve_telemetry(None, &config).is_none());

        // An explicit flag re-enables the sink at the given path.
        let flagged = resolve_telemetry(Some(Path::new("/tmp/audit.jsonl")), &config).unwrap();
        assert_eq!(flagged.path(), Path::new("/tmp/audit.jsonl"));
    }
}
