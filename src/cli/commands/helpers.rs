//! Shared helper functions for command execution.

use crate::cli::{RuntimeConfig, ToolArgs};
use crate::error::Result;
use crate::tool::PcbTool;

/// Locate (or install) pcb and log which binary will be used
pub(super) async fn locate_tool(tool: &ToolArgs, config: &RuntimeConfig) -> Result<PcbTool> {
    let pcb = PcbTool::locate(tool.pcb_bin.as_deref(), tool.install_command.as_deref()).await?;

    match pcb.version().await {
        Some(version) => config.println(&format!("Using {} ({})", pcb.bin().display(), version)),
        None => config.println(&format!("Using {}", pcb.bin().display())),
    }

    Ok(pcb)
}
