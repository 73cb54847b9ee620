//! List command - available resource modules

use super::CommandContext;
use anyhow::Result;
use clap::Parser;
use nxresource::modules::network::nxos;
use serde_json::{json, Value};

/// Arguments for the list command
#[derive(Parser, Debug, Clone, Default)]
pub struct ListArgs {
    /// Also show the states each module supports
    #[arg(long, short = 's')]
    pub states: bool,
}

impl ListArgs {
    /// Execute the list command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let modules: Vec<Value> = ctx
            .registry
            .names()
            .into_iter()
            .filter_map(|name| ctx.registry.get(name))
            .map(|module| {
                let states: Vec<&str> = nxos::find(module.name())
                    .map(|r| r.supported_states().iter().map(|s| s.as_str()).collect())
                    .unwrap_or_default();
                json!({
                    "name": module.name(),
                    "description": module.description(),
                    "states": states,
                })
            })
            .collect();

        if ctx.output.format() != crate::cli::OutputFormat::Human {
            ctx.output.document(&json!({ "modules": modules }))?;
            return Ok(0);
        }

        for module in &modules {
            let name = module["name"].as_str().unwrap_or_default();
            let description = module["description"].as_str().unwrap_or_default();
            println!("{} {}", ctx.output.bold(&format!("{:<20}", name)), description);
            if self.states {
                let states: Vec<&str> = module["states"]
                    .as_array()
                    .map(|a| a.iter().filter_map(Value::as_str).collect())
                    .unwrap_or_default();
                println!("{:<20} states: {}", "", states.join(", "));
            }
        }
        Ok(0)
    }
}
