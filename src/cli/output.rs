//! Output formatting module for nxresource
//!
//! Human output is colored YAML and command listings; JSON and YAML
//! output print one document per invocation. Messages go to stderr so that
//! stdout stays machine-readable.

use crate::cli::OutputFormat;
use anyhow::Result;
use colored::{Color, Colorize};
use nxresource::config::ColorsConfig;
use nxresource::modules::{Diff, ModuleOutput};
use serde_json::{json, Value};

/// Commands that enter a configuration context.
const CONTEXT_PREFIXES: &[&str] = &[
    "interface ",
    "vrf context ",
    "router bgp ",
    "vrf ",
    "neighbor ",
    "address-family ",
];

/// Kind of a rendered command line, for coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Add,
    Remove,
    Context,
}

impl CommandKind {
    pub fn of(command: &str) -> Self {
        if command.starts_with("no ") {
            CommandKind::Remove
        } else if CONTEXT_PREFIXES.iter().any(|p| command.starts_with(p)) {
            CommandKind::Context
        } else {
            CommandKind::Add
        }
    }
}

/// Output formatter for different output modes
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// Output format
    format: OutputFormat,
    /// Verbosity level
    verbosity: u8,
    /// Configured colors
    colors: ColorsConfig,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, format: OutputFormat, verbosity: u8, colors: ColorsConfig) -> Self {
        let use_color = use_color && colors.enabled && std::env::var("NO_COLOR").is_err();

        Self {
            use_color,
            format,
            verbosity,
            colors,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn paint(&self, text: &str, color: &str) -> String {
        if self.use_color {
            let color: Color = color.parse().unwrap_or(Color::White);
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn bold(&self, text: &str) -> String {
        if self.use_color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// Print a section header (human output only)
    pub fn section(&self, title: &str) {
        if self.format != OutputFormat::Human {
            return;
        }

        if self.use_color {
            println!("\n{}", title.cyan().bold());
            println!("{}", "-".repeat(title.len()).cyan());
        } else {
            println!("\n{}", title);
            println!("{}", "-".repeat(title.len()));
        }
    }

    /// Print a structured document in the selected format.
    pub fn document(&self, value: &Value) -> Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml | OutputFormat::Human => print!("{}", serde_yaml::to_string(value)?),
        }
        Ok(())
    }

    /// Print a fact tree under `key`.
    pub fn facts(&self, key: &str, facts: &Value) -> Result<()> {
        if self.format == OutputFormat::Human {
            print!("{}", serde_yaml::to_string(facts)?);
            return Ok(());
        }
        self.document(&json!({ key: facts }))
    }

    /// Print a command list under `key`.
    pub fn commands(&self, key: &str, commands: &[String]) -> Result<()> {
        if self.format != OutputFormat::Human {
            return self.document(&json!({ key: commands }));
        }

        if commands.is_empty() {
            println!("{}", self.paint("No changes.", &self.colors.ok));
            return Ok(());
        }
        for command in commands {
            println!("{}", self.command_line(command));
        }
        Ok(())
    }

    fn command_line(&self, command: &str) -> String {
        let color = match CommandKind::of(command) {
            CommandKind::Add => &self.colors.add,
            CommandKind::Remove => &self.colors.remove,
            CommandKind::Context => &self.colors.context,
        };
        self.paint(command, color)
    }

    /// Print the result of a module run.
    pub fn module_output(&self, name: &str, output: &ModuleOutput) -> Result<()> {
        if self.format != OutputFormat::Human {
            return self.document(&serde_json::to_value(output)?);
        }

        let status = if output.changed {
            self.paint("changed", &self.colors.changed)
        } else {
            self.paint("ok", &self.colors.ok)
        };
        println!("{}: [{}] => {}", status, name, output.msg);

        let commands = output.commands();
        if !commands.is_empty() {
            self.section("Commands");
            self.commands("commands", &commands)?;
        }
        if let Some(ref diff) = output.diff {
            self.section("Diff");
            self.diff(diff);
        }
        Ok(())
    }

    /// Print a facts diff
    pub fn diff(&self, diff: &Diff) {
        let Some(ref details) = diff.details else {
            println!("- {}", diff.before);
            println!("+ {}", diff.after);
            return;
        };

        for line in details.lines() {
            let painted = if line.starts_with('+') {
                self.paint(line, &self.colors.add)
            } else if line.starts_with('-') {
                self.paint(line, &self.colors.remove)
            } else {
                line.to_string()
            };
            println!("{}", painted);
        }
        if self.verbosity >= 1 {
            println!("{}", diff.after);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.format == OutputFormat::Json {
            eprintln!("{}", json!({"type": "error", "message": message}));
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.format == OutputFormat::Json {
            eprintln!("{}", json!({"type": "warning", "message": message}));
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {}", message);
        }
    }

    /// Print an info message (respects verbosity)
    pub fn info(&self, message: &str) {
        if self.verbosity < 1 || self.format != OutputFormat::Human {
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "INFO:".blue(), message);
        } else {
            eprintln!("INFO: {}", message);
        }
    }
}
