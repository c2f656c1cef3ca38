use std::path::PathBuf;

use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `clawguard`.
///
/// Each subsystem defines its own error enum. Callers can match on these to
/// tell caller mistakes (usage errors) apart from environment problems
/// (storage errors); the CLI layer uses `anyhow::Result` for ad-hoc context
/// chains.
#[derive(Debug, Error)]
pub enum RouterError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Mode store ───────────────────────────────────────────────────────
    #[error("mode store: {0}")]
    Store(#[from] StoreError),

    // ── Telemetry ────────────────────────────────────────────────────────
    #[error("telemetry: {0}")]
    Telemetry(#[from] TelemetryError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed reading config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed parsing config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

// ─── Mode store errors ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed reading mode record {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed writing mode record {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("mode record {path:?} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed encoding mode record: {0}")]
    Encode(serde_json::Error),
}

// ─── Telemetry errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry record must be a JSON object")]
    InvalidRecord,

    #[error("failed appending telemetry record to {path:?}: {source}")]
    Append {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed encoding telemetry record: {0}")]
    Encode(#[from] serde_json::Error),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, RouterError>;
