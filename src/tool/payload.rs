//! Structured output of `pcb release -f json`.

use crate::error::PayloadError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// How far back from the end of stdout to look for the JSON block when the
/// tool mixes log lines into its output.
pub const JSON_TAIL_LINES: usize = 64;

/// Fields consumed from the tool's JSON output
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReleasePayload {
    /// Path to the produced archive
    #[serde(default, deserialize_with = "lenient_string")]
    pub archive: String,
    /// Opaque release version
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: String,
}

/// Read a field as text: `null` and nested values become empty, scalars are
/// rendered as written.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => {
            if !other.is_null() {
                log::warn!("Ignoring non-scalar payload field: {other}");
            }
            String::new()
        }
    })
}

impl ReleasePayload {
    /// Extract the payload from captured stdout.
    ///
    /// The whole output is tried first. Failing that, the trailing block
    /// starting at the last line that opens a JSON object is tried, moving
    /// further back one candidate line at a time.
    pub fn extract(stdout: &str) -> Result<Self, PayloadError> {
        let trimmed = stdout.trim();
        let whole_err = match serde_json::from_str::<Self>(trimmed) {
            Ok(payload) => return Ok(payload),
            Err(e) => e,
        };

        let lines: Vec<&str> = stdout.lines().collect();
        let floor = lines.len().saturating_sub(JSON_TAIL_LINES);
        let mut saw_candidate = false;

        for start in (floor..lines.len()).rev() {
            if !lines[start].trim_start().starts_with('{') {
                continue;
            }
            saw_candidate = true;
            let block = lines[start..].join("\n");
            if let Ok(payload) = serde_json::from_str::<Self>(block.trim()) {
                log::debug!("Parsed release payload from line {} of tool output", start + 1);
                return Ok(payload);
            }
        }

        if saw_candidate || trimmed.starts_with('{') {
            Err(PayloadError::Malformed { source: whole_err })
        } else {
            Err(PayloadError::NotFound { lines: lines.len() })
        }
    }

    /// Like [`extract`](Self::extract), but a parse failure yields empty
    /// fields after logging a warning.
    pub fn extract_lenient(stdout: &str) -> Self {
        Self::extract(stdout).unwrap_or_else(|e| {
            log::warn!("Could not read release payload, treating fields as empty: {e}");
            Self::default()
        })
    }

    /// Archive path, with relative paths anchored at `base`.
    ///
    /// Returns `None` when the tool reported no archive.
    pub fn archive_path(&self, base: &Path) -> Option<PathBuf> {
        let archive = self.archive.trim();
        if archive.is_empty() {
            return None;
        }
        let path = PathBuf::from(archive);
        Some(if path.is_absolute() { path } else { base.join(path) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clean_json() {
        let payload =
            ReleasePayload::extract(r#"{"archive": "/tmp/a.zip", "version": "v1", "extra": 3}"#)
                .unwrap();
        assert_eq!(payload.archive, "/tmp/a.zip");
        assert_eq!(payload.version, "v1");
    }

    #[test]
    fn parses_trailing_json_after_log_lines() {
        let stdout = "Building Widget...\nwarning: unused net GND2\n{\n  \"archive\": \"out/Widget.tar.zst\",\n  \"version\": \"1.2.0\"\n}\n";
        let payload = ReleasePayload::extract(stdout).unwrap();
        assert_eq!(payload.archive, "out/Widget.tar.zst");
        assert_eq!(payload.version, "1.2.0");
    }

    #[test]
    fn ignores_earlier_json_looking_log_lines() {
        let stdout = "{not json\nprogress 50%\n{\"archive\":\"a.zip\",\"version\":\"v2\"}";
        let payload = ReleasePayload::extract(stdout).unwrap();
        assert_eq!(payload.version, "v2");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let payload = ReleasePayload::extract(r#"{"version": "v3"}"#).unwrap();
        assert!(payload.archive.is_empty());
        assert_eq!(payload.archive_path(Path::new("/ws")), None);
    }

    #[test]
    fn null_or_non_string_fields_do_not_discard_the_archive() {
        let payload =
            ReleasePayload::extract(r#"{"archive": "/tmp/a.zip", "version": null}"#).unwrap();
        assert_eq!(payload.archive, "/tmp/a.zip");
        assert_eq!(payload.version, "");

        let payload = ReleasePayload::extract_lenient(
            "log line\n{\"archive\": \"/tmp/a.zip\", \"version\": 3}",
        );
        assert_eq!(payload.archive, "/tmp/a.zip");
        assert_eq!(payload.version, "3");

        let payload =
            ReleasePayload::extract(r#"{"archive": ["x"], "version": true}"#).unwrap();
        assert_eq!(payload.archive, "");
        assert_eq!(payload.version, "true");
    }

    #[test]
    fn reports_absent_and_malformed_payloads() {
        assert!(matches!(
            ReleasePayload::extract("just logs\nno json here\n"),
            Err(PayloadError::NotFound { lines: 2 })
        ));
        assert!(matches!(
            ReleasePayload::extract("{\"archive\": "),
            Err(PayloadError::Malformed { .. })
        ));
        assert_eq!(ReleasePayload::extract_lenient(""), ReleasePayload::default());
    }

    #[test]
    fn archive_path_anchors_relative_paths() {
        let payload = ReleasePayload {
            archive: "release/a.zip".to_string(),
            version: "v1".to_string(),
        };
        assert_eq!(
            payload.archive_path(Path::new("/ws")),
            Some(PathBuf::from("/ws/release/a.zip"))
        );
    }
}
