//! Classification rule tables.
//!
//! The tables are plain data so they can evolve independently of the
//! matching algorithm in [`classifier`](super::classifier): bumping
//! [`RULE_TABLE_VERSION`] and editing a list is a rule change, not a code
//! change. A [`RuleTables`] value can also be deserialized from an external
//! source to run the classifier against a custom table set.

use serde::{Deserialize, Serialize};

/// Monotonic version of the built-in rule tables below.
pub const RULE_TABLE_VERSION: u32 = 1;

/// Actions that touch the gateway lifecycle. Compared lower-cased and
/// trimmed against the caller-supplied action string.
pub const GATEWAY_SENSITIVE_ACTIONS: &[&str] = &[
    "gateway config",
    "gateway update",
    "gateway restart",
    "gateway stop",
];

/// Gateway lifecycle invocations hidden inside a shell command rather than
/// declared as an action.
pub const GATEWAY_COMMAND_PATTERNS: &[&str] = &[
    r"\bopenclaw\s+gateway\s+config\b",
    r"\bopenclaw\s+gateway\s+update\b",
    r"\bopenclaw\s+gateway\s+restart\b",
    r"\bopenclaw\s+gateway\s+stop\b",
];

/// Shell command shapes that are irreversible or host-destroying. A match
/// is an unconditional hard stop; no surrounding context can downgrade it.
pub const DESTRUCTIVE_COMMAND_PATTERNS: &[&str] = &[
    r"\brm\s+-rf\b",
    r"\bdd\s+if=",
    r"\bmkfs\b",
    r"\bshutdown\b",
    r"\breboot\b",
    r":\(\)\s*\{\s*:\|:\s*&\s*\};:\s*",
    r"\bterraform\s+destroy\b",
    r"\bkubectl\s+delete\b",
    r"\bdrop\s+database\b",
    r"\btruncate\s+table\b",
];

/// Whole-word scope keywords that mark a call as touching production,
/// auth, billing, or secret-bearing surfaces.
pub const SENSITIVE_KEYWORD_PATTERN: &str =
    r"\b(prod|production|auth|authentication|billing|payment|security|secret|token|credential)\b";

/// Tools that write into external systems of record.
pub const EXTERNAL_WRITE_TOOLS: &[&str] = &[
    "linear_update_issue",
    "linear_create_issue",
    "notion_API-patch-page",
];

/// One complete, versioned set of classification rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTables {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub gateway_actions: Vec<String>,
    #[serde(default)]
    pub gateway_command_patterns: Vec<String>,
    #[serde(default)]
    pub destructive_command_patterns: Vec<String>,
    #[serde(default = "default_sensitive_keyword_pattern")]
    pub sensitive_keyword_pattern: String,
    #[serde(default)]
    pub external_write_tools: Vec<String>,
}

fn default_version() -> u32 {
    RULE_TABLE_VERSION
}

fn default_sensitive_keyword_pattern() -> String {
    SENSITIVE_KEYWORD_PATTERN.to_string()
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

impl Default for RuleTables {
    fn default() -> Self {
        Self {
            version: RULE_TABLE_VERSION,
            gateway_actions: owned(GATEWAY_SENSITIVE_ACTIONS),
            gateway_command_patterns: owned(GATEWAY_COMMAND_PATTERNS),
            destructive_command_patterns: owned(DESTRUCTIVE_COMMAND_PATTERNS),
            sensitive_keyword_pattern: SENSITIVE_KEYWORD_PATTERN.to_string(),
            external_write_tools: owned(EXTERNAL_WRITE_TOOLS),
        }
    }
}
