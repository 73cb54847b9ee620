//! CLI module for nxresource
//!
//! This module provides the command-line interface: argument parsing and
//! subcommand handling. Everything runs offline against captured device
//! text.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// nxresource - declarative NX-OS resource modules
///
/// Parses NX-OS running configuration into structured facts and renders the
/// commands that reconcile it with a desired configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "nxresource")]
#[command(version)]
#[command(about = "Declarative NX-OS resource modules", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format (defaults to the configured one)
    #[arg(long, global = true)]
    pub output: Option<OutputFormat>,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "NXRESOURCE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output for scripting
    Json,
    /// YAML output
    Yaml,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Parse running-config text into resource facts
    Parse(commands::parse::ParseArgs),

    /// Render the commands for a task's config without a device
    Render(commands::render::RenderArgs),

    /// Show the commands a task would send to a device
    Plan(commands::plan::PlanArgs),

    /// List available resource modules
    List(commands::list::ListArgs),
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }

    /// Output format from the flag, else from configuration.
    pub fn output_format(&self, configured: &str) -> OutputFormat {
        self.output
            .or_else(|| OutputFormat::from_str(configured, true).ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["nxresource", "render", "task.yml"]).unwrap();
        assert!(matches!(cli.command, Commands::Render(_)));
        assert_eq!(cli.output, None);
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["nxresource", "-vvvv", "list"]).unwrap();
        assert_eq!(cli.verbosity(), 3);
    }

    #[test]
    fn test_output_format() {
        let cli = Cli::try_parse_from(["nxresource", "list"]).unwrap();
        assert_eq!(cli.output_format("yaml"), OutputFormat::Yaml);
        assert_eq!(cli.output_format("bogus"), OutputFormat::Human);

        let cli = Cli::try_parse_from(["nxresource", "--output", "json", "list"]).unwrap();
        assert_eq!(cli.output_format("yaml"), OutputFormat::Json);
    }

    #[test]
    fn test_plan_args() {
        let cli = Cli::try_parse_from([
            "nxresource",
            "plan",
            "task.yml",
            "--running-config",
            "leaf1.cfg",
            "--diff",
        ])
        .unwrap();
        match cli.command {
            Commands::Plan(args) => {
                assert!(args.diff);
                assert_eq!(args.running_config, Some(PathBuf::from("leaf1.cfg")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
