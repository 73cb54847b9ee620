//! Render command - commands for a task without a device
//!
//! The task's config is rendered as if the device held nothing; its state
//! is overridden with `rendered`.

use super::CommandContext;
use anyhow::Result;
use clap::Parser;
use nxresource::modules::network::rm::State;
use nxresource::task::ResourceTask;
use std::path::PathBuf;

/// Arguments for the render command
#[derive(Parser, Debug, Clone)]
pub struct RenderArgs {
    /// Task file (YAML or JSON)
    pub task: PathBuf,
}

impl RenderArgs {
    /// Execute the render command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let mut task = ResourceTask::from_file(&self.task)?;
        if task.state != State::Rendered {
            ctx.output.info(&format!(
                "Rendering {} (task state '{}' ignored)",
                task.display_name(),
                task.state
            ));
            task.state = State::Rendered;
        }

        let output = ctx.execute(&task.module, &task.to_params(), &ctx.module_context())?;
        ctx.output.commands("rendered", &output.commands())?;
        Ok(0)
    }
}
