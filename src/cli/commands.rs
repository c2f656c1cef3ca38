use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clawguard::OrchestrationMode;

/// `clawguard` - risk-aware safety router for agent tool calls.
#[derive(Parser, Debug)]
#[command(name = "clawguard")]
#[command(version = "0.1.0")]
#[command(about = "Risk-aware safety router for agent tool calls.", long_about = None)]
pub struct Cli {
    /// TOML config file (default: ./clawguard.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the persisted mode record location
    #[arg(long, global = true, value_name = "PATH")]
    pub state_file: Option<PathBuf>,

    /// Override the telemetry target (implies telemetry is enabled)
    #[arg(long, global = true, value_name = "PATH")]
    pub telemetry: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate one tool call and print the decision as JSON
    Evaluate(EvaluateArgs),

    /// Inspect or change the persisted runtime mode
    Mode {
        #[command(subcommand)]
        mode_command: ModeCommands,
    },

    /// Evaluate a batch of task descriptors and write a Markdown report
    DryRun(DryRunArgs),

    /// Print the static policy matrix as JSON
    Policy,
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Tool name (e.g. exec, linear_update_issue)
    #[arg(long)]
    pub tool: String,

    /// Declared action
    #[arg(long, default_value = "")]
    pub action: String,

    /// Free-text intent
    #[arg(long, default_value = "")]
    pub intent: String,

    /// Call payload as a JSON object
    #[arg(long, default_value = "{}")]
    pub payload: String,

    /// Mark the call as proposed by a cloud-hosted orchestrator
    #[arg(long)]
    pub cloud_orchestrator: bool,

    /// Persist this orchestration mode before evaluating
    #[arg(long, value_enum)]
    pub mode: Option<OrchestrationMode>,

    /// Persist this guardrails state before evaluating
    #[arg(long, value_enum)]
    pub guardrails: Option<GuardrailsSwitch>,
}

#[derive(Args, Debug)]
pub struct DryRunArgs {
    /// JSON array of task descriptors
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,

    /// Where to write the Markdown report
    #[arg(long, value_name = "PATH", default_value = "reports/dry-run-report.md")]
    pub report: PathBuf,

    /// Persist this orchestration mode before the run
    #[arg(long, value_enum)]
    pub mode: Option<OrchestrationMode>,

    /// Persist this guardrails state before the run
    #[arg(long, value_enum)]
    pub guardrails: Option<GuardrailsSwitch>,
}

#[derive(Subcommand, Debug)]
pub enum ModeCommands {
    /// Show the current mode record
    Status,

    /// Switch the orchestration mode
    SetMode {
        #[arg(value_enum)]
        mode: OrchestrationMode,

        /// Audit identity recorded with the change
        #[arg(long, default_value = "operator")]
        actor: String,
    },

    /// Turn the guardrails escalation override on or off
    SetGuardrails {
        #[arg(value_enum)]
        enabled: GuardrailsSwitch,

        /// Audit identity recorded with the change
        #[arg(long, default_value = "operator")]
        actor: String,
    },
}

/// `on`/`off` argument for the guardrails toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GuardrailsSwitch {
    On,
    Off,
}

impl GuardrailsSwitch {
    pub fn enabled(self) -> bool {
        matches!(self, Self::On)
    }
}
