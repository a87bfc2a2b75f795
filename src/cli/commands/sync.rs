//! sync-workflows command.

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;
use crate::release::absolute_path;
use crate::sync::{SyncOptions, repo::WORKFLOW_PATH, run_sync};

/// Execute sync-workflows command
pub(super) async fn execute_sync(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let Command::SyncWorkflows {
        owner,
        limit,
        days,
        work_dir,
        merge_passing,
        excluded,
    } = &args.command
    else {
        unreachable!("execute_sync called with non-SyncWorkflows command");
    };

    let cwd = std::env::current_dir()?;
    let options = SyncOptions {
        owner: owner.clone(),
        limit: *limit,
        days: *days,
        work_dir: absolute_path(work_dir, &cwd),
        source_workflow: cwd.join(WORKFLOW_PATH),
        merge_passing: *merge_passing,
        excluded: excluded.iter().cloned().collect(),
    };

    run_sync(&options, config).await?;
    Ok(0)
}
