//! Diagnostic dump: writes the pieces of an unrecoverable prescription to disk.
//!
//! When no section yields anything the caller renders a diagnostic view; the
//! same bundle is kept on disk so template drift can be inspected later.
//!
//! **Activation**:
//! - Dev builds (`is_dev()`): auto-enabled, writes to `~/MedCipher-dev/diagnostic/`
//! - Prod builds: disabled unless `MEDCIPHER_DUMP_DIR` env var is set
//! - `MEDCIPHER_DUMP_DIR` overrides the default in both modes
//!
//! **Output structure**:
//! ```text
//! {dump_dir}/{dump_id}/
//!   00-source-info.json
//!   01-raw.txt
//!   02-cleaned.txt
//!   03-partial-result.json
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

use crate::config;
use crate::pipeline::prescription::{validation::validate_result, DiagnosticBundle};

// ──────────────────────────────────────────────
// Dump directory resolution
// ──────────────────────────────────────────────

/// Diagnostic dump subdirectory name inside app data.
const DIAGNOSTIC_SUBDIR: &str = "diagnostic";

/// Resolve the base dump directory.
///
/// Priority:
/// 1. `MEDCIPHER_DUMP_DIR` env var (explicit override, any build)
/// 2. `~/MedCipher-dev/diagnostic/` in dev builds (auto-enabled)
/// 3. `None` in production (disabled by default)
pub fn resolve_base_dir() -> Option<PathBuf> {
    base_dir_from(std::env::var(config::DUMP_DIR_ENV).ok())
}

fn base_dir_from(env_value: Option<String>) -> Option<PathBuf> {
    if let Some(dir) = env_value.filter(|d| !d.trim().is_empty()) {
        return Some(PathBuf::from(dir));
    }

    if config::is_dev() {
        return Some(config::app_data_dir().join(DIAGNOSTIC_SUBDIR));
    }

    None
}

/// Create `{base}/{dump_id}` and return it, or `None` (with a warning) if
/// directory creation fails. Never panics, never blocks the pipeline.
pub fn dump_dir_in(base: &Path, dump_id: &Uuid) -> Option<PathBuf> {
    let dir = base.join(dump_id.to_string());

    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(
            path = %dir.display(),
            error = %e,
            "Diagnostic dump: failed to create directory"
        );
        return None;
    }

    Some(dir)
}

// ──────────────────────────────────────────────
// Dump writers
// ──────────────────────────────────────────────

fn write_artifact(dir: &Path, filename: &str, bytes: &[u8]) {
    let path = dir.join(filename);
    match std::fs::write(&path, bytes) {
        Ok(()) => tracing::debug!(path = %path.display(), size = bytes.len(), "Artifact written"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Artifact not written"),
    }
}

/// Pretty JSON artifact. Serialization failures are logged and skipped.
pub fn dump_json<T: Serialize>(dir: &Path, filename: &str, value: &T) {
    match serde_json::to_vec_pretty(value) {
        Ok(json) => write_artifact(dir, filename, &json),
        Err(e) => tracing::warn!(filename, error = %e, "Artifact not serializable"),
    }
}

pub fn dump_text(dir: &Path, filename: &str, text: &str) {
    write_artifact(dir, filename, text.as_bytes());
}

#[derive(Serialize)]
struct SourceInfo {
    dump_id: String,
    created_at: String,
    app_version: &'static str,
    raw_length: usize,
    cleaned_length: usize,
    has_patient_info: bool,
    has_medications: bool,
    has_other_notes: bool,
}

/// Write every part of `bundle` under a fresh directory in `base`.
///
/// Returns the directory written to, or `None` if it could not be created.
pub fn dump_bundle(base: &Path, bundle: &DiagnosticBundle) -> Option<PathBuf> {
    let dump_id = Uuid::new_v4();
    let dir = dump_dir_in(base, &dump_id)?;
    let outcome = validate_result(&bundle.partial);

    let info = SourceInfo {
        dump_id: dump_id.to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
        app_version: config::APP_VERSION,
        raw_length: bundle.raw_text.len(),
        cleaned_length: bundle.cleaned_text.len(),
        has_patient_info: outcome.has_patient_info,
        has_medications: outcome.has_medications,
        has_other_notes: outcome.has_other_notes,
    };

    dump_json(&dir, "00-source-info.json", &info);
    dump_text(&dir, "01-raw.txt", &bundle.raw_text);
    dump_text(&dir, "02-cleaned.txt", &bundle.cleaned_text);
    dump_json(&dir, "03-partial-result.json", &bundle.partial);

    tracing::info!(path = %dir.display(), "Diagnostic bundle dumped");
    Some(dir)
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::prescription::{ParseResult, PatientField};

    fn bundle() -> DiagnosticBundle {
        let mut partial = ParseResult::default();
        partial.patient_info.insert(PatientField::Doctor, "Dr. Smith".into());
        DiagnosticBundle {
            raw_text: "Sure!  Doctor Name: Dr. Smith".into(),
            cleaned_text: "Sure! Doctor Name: Dr. Smith".into(),
            partial,
        }
    }

    #[test]
    fn env_value_overrides_dev_default() {
        let base = base_dir_from(Some("/tmp/medcipher-dumps".into()));
        assert_eq!(base, Some(PathBuf::from("/tmp/medcipher-dumps")));
    }

    #[test]
    fn dev_builds_fall_back_to_app_data() {
        // Test builds are debug builds, so dumps are on by default.
        let base = base_dir_from(None).unwrap();
        assert!(base.ends_with(DIAGNOSTIC_SUBDIR));
        assert_eq!(base_dir_from(Some("  ".into())), Some(base));
    }

    #[test]
    fn dump_dir_in_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dump_id = Uuid::new_v4();
        let dir = dump_dir_in(tmp.path(), &dump_id).unwrap();
        assert!(dir.exists());
        assert!(dir.ends_with(dump_id.to_string()));
    }

    #[test]
    fn dump_bundle_writes_all_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = dump_bundle(tmp.path(), &bundle()).unwrap();

        let raw = std::fs::read_to_string(dir.join("01-raw.txt")).unwrap();
        assert_eq!(raw, "Sure!  Doctor Name: Dr. Smith");
        let cleaned = std::fs::read_to_string(dir.join("02-cleaned.txt")).unwrap();
        assert_eq!(cleaned, "Sure! Doctor Name: Dr. Smith");

        let partial = std::fs::read_to_string(dir.join("03-partial-result.json")).unwrap();
        let partial: serde_json::Value = serde_json::from_str(&partial).unwrap();
        assert_eq!(partial["patientInfo"]["doctor"], "Dr. Smith");

        let info = std::fs::read_to_string(dir.join("00-source-info.json")).unwrap();
        let info: serde_json::Value = serde_json::from_str(&info).unwrap();
        assert_eq!(info["raw_length"], 29);
        assert_eq!(info["has_patient_info"], true);
        assert_eq!(info["has_medications"], false);
        assert!(info["created_at"].as_str().is_some());
    }

    #[test]
    fn dump_json_writes_pretty_json() {
        let tmp = tempfile::tempdir().unwrap();
        dump_json(tmp.path(), "info.json", &serde_json::json!({"name": "test", "value": 42}));

        let content = std::fs::read_to_string(tmp.path().join("info.json")).unwrap();
        assert!(content.contains("\"name\": \"test\""));
        assert!(content.contains('\n'));
    }

    #[test]
    fn writers_handle_failure_gracefully() {
        let bad_dir = Path::new("/nonexistent/path/that/does/not/exist");
        dump_json(bad_dir, "test.json", &"data");
        dump_text(bad_dir, "test.txt", "data");
    }

    #[test]
    fn uncreatable_base_yields_none() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("plain-file");
        std::fs::write(&file, "x").unwrap();
        assert!(dump_bundle(&file, &bundle()).is_none());
    }
}
