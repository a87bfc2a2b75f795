//! Single-target release: one path, abort on the first error.

use super::helpers::locate_tool;
use crate::artifacts::ArtifactCollector;
use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::{ConfigError, Result};
use crate::outputs::ActionOutputs;
use crate::release::{ReleaseContext, absolute_path};
use crate::source::normalize_paths;

/// Execute release command
pub(super) async fn execute_release(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let Command::Release {
        path,
        output_dir,
        tool,
    } = &args.command
    else {
        unreachable!("execute_release called with non-Release command");
    };

    let workspace = args.workspace_root()?;
    let mut paths = normalize_paths(path.as_deref(), "INPUT_PATH")?;
    if paths.len() != 1 {
        return Err(ConfigError::TooManyPaths {
            input: "INPUT_PATH".to_string(),
            count: paths.len(),
        }
        .into());
    }
    let input = paths.remove(0);

    let pcb = locate_tool(tool, config).await?;
    let ctx = ReleaseContext {
        collector: output_dir
            .as_ref()
            .map(|dir| ArtifactCollector::new(absolute_path(dir, &workspace))),
        workspace,
        tool: pcb,
    };

    config.section(&format!("Releasing {input}"));
    let artifact = ctx.release_target(&input).await?;
    let archive = absolute_path(&artifact.destination, &ctx.workspace);

    let outputs = ActionOutputs::from_env();
    outputs.set("archive", &archive.display().to_string())?;
    outputs.set("version", &artifact.version)?;

    config.success_println(&format!("Released {input} {}", artifact.version));
    config.indent(&format!("Archive: {}", archive.display()));

    Ok(0)
}
