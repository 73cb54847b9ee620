//! Subcommands module for nxresource CLI
//!
//! This module contains all the subcommand implementations.

pub mod list;
pub mod parse;
pub mod plan;
pub mod render;

use crate::cli::output::OutputFormatter;
use crate::cli::Cli;
use anyhow::Result;
use nxresource::config::Config;
use nxresource::error::Error;
use nxresource::modules::{ModuleContext, ModuleOutput, ModuleParams, ModuleRegistry};
use std::path::Path;
use tracing::debug;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
    /// Registered resource modules
    pub registry: ModuleRegistry,
    /// Verbosity level
    pub verbosity: u8,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &Cli, config: Config) -> Self {
        let output = OutputFormatter::new(
            !cli.no_color,
            cli.output_format(&config.defaults.output),
            cli.verbosity(),
            config.colors.clone(),
        );

        Self {
            config,
            output,
            registry: ModuleRegistry::with_builtins(),
            verbosity: cli.verbosity(),
        }
    }

    /// Module context seeded with the configured device defaults.
    pub fn module_context(&self) -> ModuleContext {
        ModuleContext::new().with_option_defaults(self.config.device.option_defaults.clone())
    }

    /// Run one module through the registry.
    pub fn execute(
        &self,
        module: &str,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> Result<ModuleOutput> {
        debug!(module, check_mode = context.check_mode, "Executing module");
        self.registry
            .execute(module, params, context)
            .map_err(|e| Error::module(module, e).into())
    }
}

/// Read a text file, reporting a missing one as [`Error::FileNotFound`].
pub fn read_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()).into());
    }
    Ok(std::fs::read_to_string(path).map_err(Error::from)?)
}
