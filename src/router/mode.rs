//! Persisted runtime operating mode.
//!
//! One JSON record on disk holds the orchestration mode and the guardrails
//! toggle, so operators can flip routing behavior without a redeploy.
//! Writes go through write-temporary-then-rename so a reader never sees a
//! half-written record and a crash mid-write cannot corrupt it.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::StoreError;

/// Operator preference for where tool calls should run.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OrchestrationMode {
    CloudFirst,
    LocalFirst,
    #[default]
    Hybrid,
}

/// The persisted mode record. `updated_at`/`updated_by` stay null until
/// the first explicit mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeStatus {
    pub mode: OrchestrationMode,
    pub guardrails_enabled: bool,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

/// File-backed runtime mode store.
#[derive(Debug, Clone)]
pub struct RuntimeModeStore {
    path: PathBuf,
}

impl RuntimeModeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the current record. On first use (no record persisted yet)
    /// the default record is written out and returned.
    pub fn get_status(&self) -> Result<ModeStatus, StoreError> {
        if !self.path.exists() {
            let status = ModeStatus::default();
            self.persist(&status)?;
            return Ok(status);
        }

        let raw = fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Switches the orchestration mode, stamping the audit fields.
    pub fn set_mode(&self, mode: OrchestrationMode, actor: &str) -> Result<ModeStatus, StoreError> {
        let mut status = self.get_status()?;
        info!(%mode, actor, "switching orchestration mode");
        status.mode = mode;
        self.stamp_and_persist(status, actor)
    }

    /// Flips the guardrails toggle, stamping the audit fields.
    pub fn set_guardrails_enabled(
        &self,
        enabled: bool,
        actor: &str,
    ) -> Result<ModeStatus, StoreError> {
        let mut status = self.get_status()?;
        info!(enabled, actor, "toggling guardrails");
        status.guardrails_enabled = enabled;
        self.stamp_and_persist(status, actor)
    }

    fn stamp_and_persist(
        &self,
        mut status: ModeStatus,
        actor: &str,
    ) -> Result<ModeStatus, StoreError> {
        status.updated_at = Some(Utc::now());
        status.updated_by = Some(actor.to_string());
        self.persist(&status)?;
        Ok(status)
    }

    fn persist(&self, status: &ModeStatus) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }

        let body = serde_json::to_string_pretty(status).map_err(StoreError::Encode)?;
        let temp_path = self.temp_path();
        fs::write(&temp_path, body).map_err(|source| StoreError::Write {
            path: temp_path.clone(),
            source,
        })?;

        if let Err(source) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(StoreError::Write {
                path: self.path.clone(),
                source,
            });
        }

        Ok(())
    }

    // Unique per process and call so concurrent writers never clobber
    // each other's temp file before the rename.
    fn temp_path(&self) -> PathBuf {
        static NONCE: AtomicU64 = AtomicU64::new(0);
        let nonce = NONCE.fetch_add(1, Ordering::Relaxed);
        self.path
            .with_extension(format!("tmp.{}.{nonce}", process::id()))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn store_in(dir: &TempDir) -> RuntimeModeStore {
        RuntimeModeStore::new(dir.path().join("state").join("runtime_mode.json"))
    }

    #[test]
    fn first_read_creates_default_record() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let status = store.get_status().unwrap();
        assert_eq!(status.mode, OrchestrationMode::Hybrid);
        assert!(!status.guardrails_enabled);
        assert!(status.updated_at.is_none());
        assert!(status.updated_by.is_none());

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"mode\": \"hybrid\""));
        assert!(raw.contains("\"updated_at\": null"));
    }

    #[test]
    fn set_mode_stamps_audit_fields_and_persists() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let status = store.set_mode(OrchestrationMode::CloudFirst, "ops").unwrap();
        assert_eq!(status.mode, OrchestrationMode::CloudFirst);
        assert_eq!(status.updated_by.as_deref(), Some("ops"));
        assert!(status.updated_at.is_some());

        // A fresh store over the same file sees the persisted value.
        let reread = RuntimeModeStore::new(store.path()).get_status().unwrap();
        assert_eq!(reread, status);
    }

    #[test]
    fn set_guardrails_preserves_mode() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.set_mode(OrchestrationMode::LocalFirst, "ops").unwrap();
        let status = store.set_guardrails_enabled(true, "ops").unwrap();
        assert_eq!(status.mode, OrchestrationMode::LocalFirst);
        assert!(status.guardrails_enabled);

        let status = store.set_guardrails_enabled(false, "ops").unwrap();
        assert!(!status.guardrails_enabled);
        assert_eq!(status.mode, OrchestrationMode::LocalFirst);
    }

    #[test]
    fn corrupt_record_surfaces_as_corrupt_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "not json {{").unwrap();

        let error = store.get_status().unwrap_err();
        assert!(matches!(error, StoreError::Corrupt { .. }));
    }

    #[test]
    fn unknown_mode_value_surfaces_as_corrupt_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(
            store.path(),
            r#"{"mode": "turbo", "guardrails_enabled": false}"#,
        )
        .unwrap();

        assert!(matches!(store.get_status().unwrap_err(), StoreError::Corrupt { .. }));
    }

    #[test]
    fn record_with_absent_audit_fields_parses() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(
            store.path(),
            r#"{"mode": "local-first", "guardrails_enabled": true}"#,
        )
        .unwrap();

        let status = store.get_status().unwrap();
        assert_eq!(status.mode, OrchestrationMode::LocalFirst);
        assert!(status.guardrails_enabled);
        assert!(status.updated_at.is_none());
    }

    #[test]
    fn writes_leave_no_temp_files_behind() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set_mode(OrchestrationMode::CloudFirst, "ops").unwrap();
        store.set_guardrails_enabled(true, "ops").unwrap();

        let entries: Vec<_> = std::fs::read_dir(store.path().parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec!["runtime_mode.json"]);
    }

    #[test]
    fn mode_serialization_is_kebab_case() {
        assert_eq!(
            serde_json::to_string(&OrchestrationMode::CloudFirst).unwrap(),
            "\"cloud-first\""
        );
        assert_eq!(OrchestrationMode::LocalFirst.to_string(), "local-first");
    }
}
