//! Plan command - offline dry run
//!
//! Replays a captured running config as the device, runs the task in check
//! mode, and prints the commands it would send. With `--diff`, the current
//! facts are diffed against the facts the task is expected to produce.

use super::{read_text, CommandContext};
use anyhow::{bail, Result};
use clap::Parser;
use nxresource::modules::network::ReplayTransport;
use nxresource::task::ResourceTask;
use std::path::PathBuf;
use std::sync::Arc;

/// Hostname reported by the offline transport
const OFFLINE_DEVICE: &str = "offline";

/// Arguments for the plan command
#[derive(Parser, Debug, Clone)]
pub struct PlanArgs {
    /// Task file (YAML or JSON)
    pub task: PathBuf,

    /// File holding the device's running config; defaults to the task's
    /// `running_config`
    #[arg(long, short = 'r')]
    pub running_config: Option<PathBuf>,

    /// Show a facts diff
    #[arg(long, short = 'D')]
    pub diff: bool,
}

impl PlanArgs {
    /// Execute the plan command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let task = ResourceTask::from_file(&self.task)?;

        let running_config = match (&self.running_config, &task.running_config) {
            (Some(path), _) => read_text(path)?,
            (None, Some(text)) => text.clone(),
            (None, None) => bail!(
                "{} needs a running config: pass --running-config or set running_config in the task",
                task.display_name()
            ),
        };

        let transport = ReplayTransport::new(OFFLINE_DEVICE)
            .with_running_config(running_config)
            .with_option_defaults(ctx.config.device.option_defaults.clone());
        let context = ctx
            .module_context()
            .with_check_mode(true)
            .with_diff_mode(self.diff)
            .with_transport(Arc::new(transport));

        let output = ctx.execute(&task.module, &task.to_params(), &context)?;
        ctx.output.module_output(task.display_name(), &output)?;
        Ok(0)
    }
}
