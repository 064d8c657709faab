//! Regeneration guard: skip artifact writes when nothing substantive changed.
//!
//! Keeps deployment diffs clean: a rebuild that only moves the generation
//! timestamp leaves the previously committed artifact untouched.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use docsmith_shared::{DocsmithError, Result, WriteOutcome};

/// Field exempted from the unchanged-artifact comparison.
const GENERATED_AT: &str = "generatedAt";

/// Write `payload` to `path` as pretty-printed JSON unless it equals the
/// existing artifact.
///
/// With `preserve_generated_at` set, the existing artifact's timestamp is
/// substituted into a copy of the new payload before comparing, so a pure
/// timestamp change reports [`WriteOutcome::Unchanged`]. A missing or
/// unparsable existing artifact counts as absent and never fails the build.
pub fn write_json_if_changed(
    path: &Path,
    payload: &Value,
    preserve_generated_at: bool,
) -> Result<WriteOutcome> {
    if let Some(existing) = read_json_lenient(path) {
        if preserve_generated_at {
            if let (Some(old_ts), Value::Object(new_map)) =
                (existing.get(GENERATED_AT), payload.clone())
            {
                let mut candidate = new_map;
                if candidate.contains_key(GENERATED_AT) {
                    candidate.insert(GENERATED_AT.to_string(), old_ts.clone());
                    if Value::Object(candidate) == existing {
                        debug!(path = %path.display(), "artifact unchanged, skipping write");
                        return Ok(WriteOutcome::Unchanged);
                    }
                }
            }
        }
        if existing == *payload {
            debug!(path = %path.display(), "artifact identical, skipping write");
            return Ok(WriteOutcome::Unchanged);
        }
    }

    write_json(path, payload)?;
    Ok(WriteOutcome::Written)
}

/// Load an existing artifact; missing or malformed files count as absent.
fn read_json_lenient(path: &Path) -> Option<Value> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "existing artifact unparsable, treating as absent");
            None
        }
    }
}

/// Write pretty-printed JSON with a trailing newline, creating parent dirs.
fn write_json(path: &Path, payload: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DocsmithError::io(parent, e))?;
    }

    let json = serde_json::to_string_pretty(payload)
        .map_err(|e| DocsmithError::validation(format!("JSON serialization failed: {e}")))?;
    std::fs::write(path, format!("{json}\n")).map_err(|e| DocsmithError::io(path, e))?;

    debug!(path = %path.display(), "wrote artifact");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::SystemTime;

    fn payload(ts: &str, body: &str) -> Value {
        json!({ "generatedAt": ts, "kind": "docs", "count": 1, "body": body })
    }

    #[test]
    fn first_write_reports_written() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("index.json");

        let outcome = write_json_if_changed(&path, &payload("t1", "a"), true).unwrap();
        assert_eq!(outcome, WriteOutcome::Written);
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn timestamp_only_change_skips_write() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("index.json");

        write_json_if_changed(&path, &payload("t1", "a"), true).unwrap();
        let mtime_before = modified(&path);

        let outcome = write_json_if_changed(&path, &payload("t2", "a"), true).unwrap();
        assert_eq!(outcome, WriteOutcome::Unchanged);
        assert_eq!(modified(&path), mtime_before);

        // The original timestamp is still on disk.
        let on_disk: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["generatedAt"], "t1");
    }

    #[test]
    fn substantive_change_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("index.json");

        write_json_if_changed(&path, &payload("t1", "a"), true).unwrap();
        let outcome = write_json_if_changed(&path, &payload("t2", "b"), true).unwrap();
        assert_eq!(outcome, WriteOutcome::Written);

        let on_disk: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["generatedAt"], "t2");
        assert_eq!(on_disk["body"], "b");
    }

    #[test]
    fn timestamp_change_without_exemption_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("index.json");

        write_json_if_changed(&path, &payload("t1", "a"), false).unwrap();
        let outcome = write_json_if_changed(&path, &payload("t2", "a"), false).unwrap();
        assert_eq!(outcome, WriteOutcome::Written);
    }

    #[test]
    fn unparsable_existing_artifact_treated_as_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("index.json");
        std::fs::write(&path, "{ not json").unwrap();

        let outcome = write_json_if_changed(&path, &payload("t1", "a"), true).unwrap();
        assert_eq!(outcome, WriteOutcome::Written);
    }

    #[test]
    fn creates_parent_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/deep/index.json");

        let outcome = write_json_if_changed(&path, &payload("t1", "a"), true).unwrap();
        assert_eq!(outcome, WriteOutcome::Written);
        assert!(path.exists());
    }

    fn modified(path: &Path) -> SystemTime {
        std::fs::metadata(path).unwrap().modified().unwrap()
    }
}
