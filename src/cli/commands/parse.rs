//! Parse command - running config to facts
//!
//! Runs a resource module with state `parsed` over a captured
//! running-config file and prints the resulting facts.

use super::{read_text, CommandContext};
use anyhow::Result;
use clap::Parser;
use nxresource::modules::network::rm::State;
use nxresource::modules::ModuleParams;
use serde_json::{json, Value};
use std::path::PathBuf;

/// Arguments for the parse command
#[derive(Parser, Debug, Clone)]
pub struct ParseArgs {
    /// Resource module name (e.g. nxos_interfaces)
    pub resource: String,

    /// File holding `show running-config` output
    pub running_config: PathBuf,
}

impl ParseArgs {
    /// Execute the parse command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let text = read_text(&self.running_config)?;

        let mut params = ModuleParams::new();
        params.insert("state".to_string(), json!(State::Parsed.as_str()));
        params.insert("running_config".to_string(), Value::String(text));

        let output = ctx.execute(&self.resource, &params, &ctx.module_context())?;
        ctx.output
            .info(&format!("{}: {}", self.running_config.display(), output.msg));

        let facts = output.data.get("parsed").cloned().unwrap_or(Value::Null);
        ctx.output.facts("parsed", &facts)?;
        Ok(0)
    }
}
