//! Append-only decision audit trail.
//!
//! Every record lands as one self-contained JSON object per line, appended
//! in a single write so concurrent loggers never interleave partial lines.
//! Readers can stream the file and parse each line without context from
//! its neighbors.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;

use crate::error::TelemetryError;

/// JSON-lines sink for guard decisions and mode changes.
#[derive(Debug, Clone)]
pub struct EscalationTelemetry {
    path: PathBuf,
}

impl EscalationTelemetry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record. The `ts` field is stamped here, at emission
    /// time; a caller-supplied `ts` is overwritten, never trusted.
    pub fn log(&self, record: Value) -> Result<(), TelemetryError> {
        let Value::Object(mut fields) = record else {
            return Err(TelemetryError::InvalidRecord);
        };
        fields.insert("ts".to_string(), Value::String(Utc::now().to_rfc3339()));

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| TelemetryError::Append {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }

        let mut line = serde_json::to_string(&fields)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| TelemetryError::Append {
                path: self.path.clone(),
                source,
            })?;
        file.write_all(line.as_bytes())
            .map_err(|source| TelemetryError::Append {
                path: self.path.clone(),
                source,
            })
    }
}
