//! Common network device utilities and types
//!
//! This module provides shared functionality for the NX-OS resource modules:
//! - The device transport seam (`DeviceTransport`) and its errors
//! - Configuration session handling (`send_config`)
//! - Offline replay of captured device output (`ReplayTransport`)
//! - Device-wide option defaults (`parse_system_defaults`)
//! - Fact diffs for diff mode

use crate::modules::network::rm::{OptionDefaults, RmError, RmResult};
use crate::modules::Diff;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use serde_json::Value;
use similar::{ChangeTag, TextDiff};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

// ============================================================================
// Transport Types
// ============================================================================

/// Errors raised by a device transport
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Command timed out after {0} seconds")]
    Timeout(u64),

    #[error("Connection closed")]
    Closed,

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// CLI session to one device.
///
/// Commands are sent one at a time, in order, over a single session.
pub trait DeviceTransport: Send + Sync {
    /// Identifier used in logs (usually the device hostname)
    fn identifier(&self) -> String;

    /// Send one command and return its output.
    fn send(&self, command: &str) -> TransportResult<String>;

    /// Device-wide defaults that change what an unset attribute means.
    fn get_option_defaults(&self) -> TransportResult<OptionDefaults> {
        let output = self.send(SYSTEM_DEFAULTS_COMMAND)?;
        Ok(parse_system_defaults(&output))
    }
}

/// Show command whose output feeds [`parse_system_defaults`]
pub const SYSTEM_DEFAULTS_COMMAND: &str =
    "show running-config all | include 'system default switchport'";

// ============================================================================
// Configuration Session
// ============================================================================

const ENTER_CONFIG_MODE: &str = "configure terminal";
const EXIT_CONFIG_MODE: &str = "end";

/// Send `commands` inside a configuration session.
///
/// A failure after the session is opened leaves the device partially
/// configured; the error reports how many commands were applied.
pub fn send_config(transport: &dyn DeviceTransport, commands: &[String]) -> RmResult<()> {
    if commands.is_empty() {
        return Ok(());
    }

    transport.send(ENTER_CONFIG_MODE)?;

    for (applied, command) in commands.iter().enumerate() {
        debug!(device = %transport.identifier(), command = %command, "Sending command");
        if let Err(source) = transport.send(command) {
            warn!(
                device = %transport.identifier(),
                applied,
                total = commands.len(),
                error = %source,
                "Configuration partially applied"
            );
            if let Err(e) = transport.send(EXIT_CONFIG_MODE) {
                debug!(error = %e, "Could not leave configuration mode");
            }
            return Err(RmError::PartialApply {
                applied,
                total: commands.len(),
                source,
            });
        }
    }

    transport.send(EXIT_CONFIG_MODE)?;
    Ok(())
}

/// Strip the command echo and trailing prompt lines from show output.
pub fn clean_show_output(output: &str) -> String {
    let mut lines: Vec<&str> = output.lines().collect();

    if lines.first().is_some_and(|first| first.trim_start().starts_with("show ")) {
        lines.remove(0);
    }

    while let Some(last) = lines.last() {
        let last = last.trim();
        if last.is_empty() || last.ends_with('#') || last.ends_with('>') {
            lines.pop();
        } else {
            break;
        }
    }

    lines.join("\n")
}

// ============================================================================
// Option Defaults
// ============================================================================

static SWITCHPORT_DEFAULT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<no>no )?system default switchport$").unwrap());

static SWITCHPORT_SHUTDOWN_DEFAULT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<no>no )?system default switchport shutdown$").unwrap());

/// Read interface defaults from `show running-config all` output.
///
/// `system default switchport` makes ports layer 2, its negation layer 3;
/// `system default switchport shutdown` makes ports start disabled.
/// Settings absent from the output are left out of the result.
pub fn parse_system_defaults(text: &str) -> OptionDefaults {
    let mut defaults = OptionDefaults::new();

    for line in text.lines().map(str::trim) {
        if let Some(caps) = SWITCHPORT_DEFAULT.captures(line) {
            let mode = if caps.name("no").is_some() { "layer3" } else { "layer2" };
            defaults.insert("mode".to_string(), Value::String(mode.to_string()));
        } else if let Some(caps) = SWITCHPORT_SHUTDOWN_DEFAULT.captures(line) {
            let enabled = caps.name("no").is_some();
            defaults.insert("enabled".to_string(), Value::Bool(enabled));
        }
    }

    defaults
}

// ============================================================================
// Offline Transport
// ============================================================================

/// Transport that answers show commands from captured text and records
/// everything it is sent.
#[derive(Debug, Default)]
pub struct ReplayTransport {
    hostname: String,
    responses: HashMap<String, String>,
    running_config: Option<String>,
    option_defaults: OptionDefaults,
    sent: Mutex<Vec<String>>,
}

impl ReplayTransport {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Default::default()
        }
    }

    /// Answer any show command without a specific response with this text.
    pub fn with_running_config(mut self, text: impl Into<String>) -> Self {
        self.running_config = Some(text.into());
        self
    }

    pub fn with_response(mut self, command: impl Into<String>, output: impl Into<String>) -> Self {
        self.responses.insert(command.into(), output.into());
        self
    }

    /// Defaults reported when the captured text carries none.
    pub fn with_option_defaults(mut self, defaults: OptionDefaults) -> Self {
        self.option_defaults = defaults;
        self
    }

    /// Every command sent, in order.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    /// Commands sent inside configuration sessions.
    pub fn config_commands(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|c| {
                !c.starts_with("show ") && *c != ENTER_CONFIG_MODE && *c != EXIT_CONFIG_MODE
            })
            .cloned()
            .collect()
    }
}

impl DeviceTransport for ReplayTransport {
    fn identifier(&self) -> String {
        self.hostname.clone()
    }

    fn send(&self, command: &str) -> TransportResult<String> {
        self.sent.lock().push(command.to_string());

        if let Some(output) = self.responses.get(command) {
            return Ok(output.clone());
        }
        if command.starts_with("show ") {
            return Ok(self.running_config.clone().unwrap_or_default());
        }
        Ok(String::new())
    }

    fn get_option_defaults(&self) -> TransportResult<OptionDefaults> {
        let mut defaults = self.option_defaults.clone();
        let captured = self
            .responses
            .get(SYSTEM_DEFAULTS_COMMAND)
            .or(self.running_config.as_ref());
        if let Some(text) = captured {
            defaults.extend(parse_system_defaults(text));
        }
        Ok(defaults)
    }
}

// ============================================================================
// Fact Diff
// ============================================================================

/// Unified diff between two fact trees, rendered as YAML.
pub fn generate_facts_diff(before: &Value, after: &Value) -> Diff {
    let before_text = to_yaml(before);
    let after_text = to_yaml(after);
    let text_diff = TextDiff::from_lines(&before_text, &after_text);

    let mut details = String::new();
    let mut additions = 0;
    let mut deletions = 0;

    for change in text_diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => {
                deletions += 1;
                "-"
            }
            ChangeTag::Insert => {
                additions += 1;
                "+"
            }
            ChangeTag::Equal => " ",
        };
        details.push_str(&format!("{}{}", sign, change));
    }

    Diff {
        before: format!("{} lines", before_text.lines().count()),
        after: format!(
            "{} lines ({} additions, {} deletions)",
            after_text.lines().count(),
            additions,
            deletions
        ),
        details: Some(details),
    }
}

fn to_yaml(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        _ => serde_yaml::to_string(value).unwrap_or_else(|_| value.to_string()),
    }
}
