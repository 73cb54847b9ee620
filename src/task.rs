//! Task files
//!
//! A task names one resource module and the parameters it runs with:
//!
//! ```yaml
//! name: Configure uplinks
//! module: nxos_interfaces
//! state: replaced
//! config:
//!   - name: Ethernet1/1
//!     description: uplink to spine1
//!     mtu: "9216"
//! ```
//!
//! YAML and JSON are accepted; `.json` files are read as JSON, everything
//! else as YAML.

use crate::error::{Error, Result};
use crate::modules::network::rm::State;
use crate::modules::ModuleParams;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// One resource-module invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceTask {
    /// Optional display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Module name, e.g. `nxos_vrf_global`
    pub module: String,

    #[serde(default)]
    pub state: State,

    /// Desired configuration in schema (list) form
    #[serde(default)]
    pub config: Value,

    /// Device text for the parsed state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running_config: Option<String>,
}

impl ResourceTask {
    /// Load a task from a YAML or JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;

        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        let parsed: std::result::Result<Self, Box<dyn std::error::Error + Send + Sync>> = if is_json
        {
            serde_json::from_str(&content).map_err(Into::into)
        } else {
            serde_yaml::from_str(&content).map_err(Into::into)
        };

        let task = parsed.map_err(|e| Error::task_load(path, e.to_string(), Some(e)))?;
        task.validate()?;
        Ok(task)
    }

    /// Parse a task from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let task: Self = serde_yaml::from_str(content)?;
        task.validate()?;
        Ok(task)
    }

    /// Display name: the task name, or the module name.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.module)
    }

    fn validate(&self) -> Result<()> {
        if self.module.trim().is_empty() {
            return Err(Error::TaskValidation("module must not be empty".to_string()));
        }
        Ok(())
    }

    /// Module parameters for this task.
    pub fn to_params(&self) -> ModuleParams {
        let mut params = ModuleParams::new();
        params.insert(
            "state".to_string(),
            Value::String(self.state.as_str().to_string()),
        );
        if !self.config.is_null() {
            params.insert("config".to_string(), self.config.clone());
        }
        if let Some(ref text) = self.running_config {
            params.insert("running_config".to_string(), Value::String(text.clone()));
        }
        params
    }
}
