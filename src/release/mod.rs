//! Release pipeline: resolve a target, run `pcb release`, collect the archive.
//!
//! Batch mode records per-target failures in a [`BatchReport`] and keeps
//! going; run-level errors stop the batch.

use crate::artifacts::{ArtifactCollector, CollectedArtifact};
use crate::cli::RuntimeConfig;
use crate::error::{ReleaseError, Result};
use crate::source::Target;
use crate::tool::PcbTool;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Everything needed to release targets in one workspace
#[derive(Debug, Clone)]
pub struct ReleaseContext {
    /// Workspace root; relative inputs and archive paths are anchored here
    pub workspace: PathBuf,
    /// Located `pcb` binary
    pub tool: PcbTool,
    /// Where archives are copied; `None` leaves archives in place
    pub collector: Option<ArtifactCollector>,
}

impl ReleaseContext {
    /// Release one raw input end to end
    pub async fn release_target(&self, input: &str) -> Result<CollectedArtifact> {
        let target = Target::resolve(input, &self.workspace)?;
        log::info!("Releasing {} ({})", target.path.display(), input);

        let payload = self.tool.release(&target, &self.workspace).await?;

        let collected = match &self.collector {
            Some(collector) => collector.collect(&target, &payload, &self.workspace)?,
            None => {
                let archive = ArtifactCollector::verify_archive(&payload, &self.workspace)?;
                CollectedArtifact {
                    input: target.input.clone(),
                    version: payload.version.clone(),
                    source: archive.clone(),
                    destination: archive,
                }
            }
        };

        Ok(collected)
    }

    /// Release every input in order, continuing past per-target failures
    pub async fn release_batch(
        &self,
        inputs: &[String],
        config: &RuntimeConfig,
    ) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        for (index, input) in inputs.iter().enumerate() {
            config.section(&format!("[{}/{}] {}", index + 1, inputs.len(), input));

            match self.release_target(input).await {
                Ok(artifact) => {
                    if let Some(earlier) = report.collected_for(&artifact.destination) {
                        config.warning_println(&format!(
                            "{input} replaced the copy from {earlier}: {}",
                            artifact.destination.display()
                        ));
                    }
                    config.success_println(&format!(
                        "{} {} → {}",
                        input,
                        artifact.version,
                        artifact.destination.display()
                    ));
                    report.collected.push(artifact);
                }
                Err(e) if e.is_per_target() => {
                    config.error_println(&format!("{input}: {e}"));
                    report.failures.push(TargetFailure {
                        input: input.clone(),
                        error: e,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }
}

/// One target that failed in batch mode
#[derive(Debug)]
pub struct TargetFailure {
    /// Raw input of the failed target
    pub input: String,
    /// Why it failed
    pub error: ReleaseError,
}

/// Aggregate outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Artifacts collected, in input order
    pub collected: Vec<CollectedArtifact>,
    /// Failed targets, in input order
    pub failures: Vec<TargetFailure>,
}

impl BatchReport {
    /// Whether every target succeeded
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Process exit code for this report
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    /// Raw inputs of failed targets
    pub fn failed_inputs(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.input.as_str()).collect()
    }

    /// Raw input of an earlier artifact already collected to `destination`
    pub fn collected_for(&self, destination: &Path) -> Option<&str> {
        self.collected
            .iter()
            .find(|a| a.destination == destination)
            .map(|a| a.input.as_str())
    }

    /// Collected artifact paths, newline-delimited, each listed once
    pub fn artifact_list(&self) -> String {
        let mut seen = HashSet::new();
        self.collected
            .iter()
            .filter(|a| seen.insert(a.destination.as_path()))
            .map(|a| a.destination.display().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Absolute form of `path`, anchored at `base` when relative
pub fn absolute_path(path: &Path, base: &Path) -> PathBuf {
    use path_absolutize::Absolutize;

    path.absolutize_from(base)
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| base.join(path))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// Fake pcb: boards named `Broken*` fail, `Ghost*` report a missing
    /// archive, everything else produces `<stem>.zip` next to the workspace.
    fn fake_pcb(dir: &Path) -> PcbTool {
        let bin = dir.join("pcb");
        let script = r#"#!/bin/sh
name=$(basename "$2" .zen)
case "$name" in
  Broken*) echo "cannot release $name" >&2; exit 1 ;;
  Ghost*) echo "{\"archive\": \"gone/$name.zip\", \"version\": \"v1\"}" ;;
  *) mkdir -p build && printf 'zip %s' "$name" > "build/$name.zip"
     echo "release of $name"
     echo "{\"archive\": \"build/$name.zip\", \"version\": \"v1\"}" ;;
esac
"#;
        std::fs::write(&bin, script).unwrap();
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();
        PcbTool::new(bin)
    }

    fn board(ws: &Path, name: &str) {
        let dir = ws.join("boards").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{name}.zen")), "").unwrap();
    }

    fn context(ws: &TempDir, tools: &TempDir) -> ReleaseContext {
        ReleaseContext {
            workspace: ws.path().to_path_buf(),
            tool: fake_pcb(tools.path()),
            collector: Some(ArtifactCollector::new(ws.path().join("artifacts"))),
        }
    }

    #[tokio::test]
    async fn release_target_collects_versioned_copy() {
        let ws = TempDir::new().unwrap();
        let tools = TempDir::new().unwrap();
        board(ws.path(), "Widget");

        let artifact = context(&ws, &tools)
            .release_target("boards/Widget")
            .await
            .unwrap();
        assert_eq!(artifact.destination, ws.path().join("artifacts/Widget-v1.zip"));
        assert_eq!(std::fs::read(&artifact.destination).unwrap(), b"zip Widget");
        assert!(ws.path().join("build/Widget.zip").exists());
    }

    #[tokio::test]
    async fn release_target_without_collector_reports_archive_in_place() {
        let ws = TempDir::new().unwrap();
        let tools = TempDir::new().unwrap();
        board(ws.path(), "Widget");

        let mut ctx = context(&ws, &tools);
        ctx.collector = None;
        let artifact = ctx.release_target("boards/Widget/Widget.zen").await.unwrap();
        assert_eq!(artifact.destination, ws.path().join("build/Widget.zip"));
        assert!(!ws.path().join("artifacts").exists());
    }

    #[tokio::test]
    async fn batch_continues_past_failures() {
        let ws = TempDir::new().unwrap();
        let tools = TempDir::new().unwrap();
        board(ws.path(), "Broken");
        board(ws.path(), "Ghost");
        board(ws.path(), "Widget");

        let inputs: Vec<String> = [
            "boards/Broken",
            "boards/Ghost",
            "boards/Missing",
            "boards/Widget",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let report = context(&ws, &tools)
            .release_batch(&inputs, &RuntimeConfig::new())
            .await
            .unwrap();

        assert_eq!(
            report.failed_inputs(),
            vec!["boards/Broken", "boards/Ghost", "boards/Missing"]
        );
        assert!(matches!(
            report.failures[1].error,
            ReleaseError::Artifact(crate::error::ArtifactError::Missing { .. })
        ));
        assert_eq!(report.collected.len(), 1);
        assert_eq!(report.exit_code(), 1);
        assert_eq!(
            report.artifact_list(),
            ws.path().join("artifacts/Widget-v1.zip").display().to_string()
        );
    }

    #[tokio::test]
    async fn batch_first_fails_second_succeeds() {
        let ws = TempDir::new().unwrap();
        let tools = TempDir::new().unwrap();
        board(ws.path(), "Broken");
        board(ws.path(), "Widget");

        let inputs = vec!["boards/Broken".to_string(), "boards/Widget".to_string()];
        let report = context(&ws, &tools)
            .release_batch(&inputs, &RuntimeConfig::new())
            .await
            .unwrap();

        assert_eq!(report.failed_inputs(), vec!["boards/Broken"]);
        assert_eq!(report.exit_code(), 1);
    }

    #[tokio::test]
    async fn batch_lists_clashing_destinations_once() {
        let ws = TempDir::new().unwrap();
        let tools = TempDir::new().unwrap();
        for group in ["left", "right"] {
            let dir = ws.path().join(group).join("Widget");
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("Widget.zen"), "").unwrap();
        }

        let inputs = vec!["left/Widget".to_string(), "right/Widget".to_string()];
        let report = context(&ws, &tools)
            .release_batch(&inputs, &RuntimeConfig::new())
            .await
            .unwrap();

        let destination = ws.path().join("artifacts/Widget-v1.zip");
        assert!(report.is_success());
        assert_eq!(report.collected.len(), 2);
        assert_eq!(report.collected_for(&destination), Some("left/Widget"));
        assert_eq!(report.artifact_list(), destination.display().to_string());
    }

    #[tokio::test]
    async fn batch_aborts_when_tool_cannot_start() {
        let ws = TempDir::new().unwrap();
        board(ws.path(), "Widget");
        board(ws.path(), "Other");

        let ctx = ReleaseContext {
            workspace: ws.path().to_path_buf(),
            tool: PcbTool::new(ws.path().join("no-such-pcb")),
            collector: None,
        };
        let inputs = vec!["boards/Widget".to_string(), "boards/Other".to_string()];
        let err = ctx
            .release_batch(&inputs, &RuntimeConfig::new())
            .await
            .unwrap_err();
        assert!(!err.is_per_target());
    }

    #[test]
    fn absolute_path_anchors_relative_paths() {
        assert_eq!(
            absolute_path(Path::new("artifacts"), Path::new("/ws")),
            PathBuf::from("/ws/artifacts")
        );
        assert_eq!(
            absolute_path(Path::new("/abs/x.zip"), Path::new("/ws")),
            PathBuf::from("/abs/x.zip")
        );
    }
}
