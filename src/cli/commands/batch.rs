//! Batch release: many paths, failures recorded and reported at the end.

use super::helpers::locate_tool;
use crate::artifacts::ArtifactCollector;
use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;
use crate::outputs::ActionOutputs;
use crate::release::{ReleaseContext, absolute_path};
use crate::source::{normalize_paths, write_path_list};

/// Execute batch command
pub(super) async fn execute_batch(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let Command::Batch {
        paths,
        output_dir,
        tool,
    } = &args.command
    else {
        unreachable!("execute_batch called with non-Batch command");
    };

    let workspace = args.workspace_root()?;
    let inputs = normalize_paths(paths.as_deref(), "INPUT_PATHS")?;
    let list_file = write_path_list(&workspace, &inputs)?;
    log::debug!("Wrote {} path(s) to {}", inputs.len(), list_file.display());

    config.println(&format!("📦 {} target(s) to release", inputs.len()));
    for input in &inputs {
        config.indent(input);
    }

    let pcb = locate_tool(tool, config).await?;
    let output_dir = absolute_path(output_dir, &workspace);
    let ctx = ReleaseContext {
        workspace,
        tool: pcb,
        collector: Some(ArtifactCollector::new(&output_dir)),
    };

    let report = ctx.release_batch(&inputs, config).await?;

    let outputs = ActionOutputs::from_env();
    outputs.set("artifacts-dir", &output_dir.display().to_string())?;
    outputs.set("artifacts", &report.artifact_list())?;

    config.section("Summary");
    config.println(&format!(
        "{} released, {} failed",
        report.collected.len(),
        report.failures.len()
    ));
    for artifact in &report.collected {
        config.indent(&format!("✓ {}", artifact.destination.display()));
    }

    if !report.is_success() {
        config.error_println("Failed targets:");
        for failure in &report.failures {
            config.indent(&format!("✗ {}: {}", failure.input, failure.error));
        }
    }

    Ok(report.exit_code())
}
