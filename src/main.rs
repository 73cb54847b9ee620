//! nxresource - declarative NX-OS resource modules
//!
//! This is the main entry point for the nxresource CLI.

mod cli;

use anyhow::Result;
use cli::commands::CommandContext;
use cli::{Cli, Commands};
use nxresource::config::Config;
use nxresource::telemetry;

/// Application version information
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config = Config::load(cli.config.as_deref()).unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}", e);
        Config::default()
    });

    // Initialize logging from configuration, raised by -v
    let mut logging = config.logging.clone();
    if cli.no_color {
        logging.ansi_colors = false;
    }
    if let Err(e) = telemetry::init_logging(&logging, cli.verbosity()) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }
    tracing::debug!(version = VERSION, "nxresource starting");

    // Create command context
    let mut ctx = CommandContext::new(&cli, config);

    // Execute the appropriate command
    let exit_code = match dispatch(&cli, &mut ctx) {
        Ok(code) => code,
        Err(e) => {
            ctx.output.error(&format!("{:#}", e));
            exit_code(&e)
        }
    };

    std::process::exit(exit_code);
}

fn dispatch(cli: &Cli, ctx: &mut CommandContext) -> Result<i32> {
    match &cli.command {
        Commands::Parse(args) => args.execute(ctx),
        Commands::Render(args) => args.execute(ctx),
        Commands::Plan(args) => args.execute(ctx),
        Commands::List(args) => args.execute(ctx),
    }
}

/// Process exit code for an error; application errors carry their own.
fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<nxresource::error::Error>()
        .map_or(1, nxresource::error::Error::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nxresource::error::Error;
    use std::path::PathBuf;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_exit_code() {
        let missing: anyhow::Error = Error::FileNotFound(PathBuf::from("task.yml")).into();
        assert_eq!(exit_code(&missing), 4);
        assert_eq!(exit_code(&anyhow::anyhow!("plain failure")), 1);
    }
}
