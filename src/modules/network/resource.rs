//! Resource module wrapper
//!
//! Adapts any [`Resource`] to the [`Module`] trait: parameter handling,
//! device round trips, and the per-state output shape.
//!
//! # Parameters
//!
//! | Parameter        | Required                          | Description                        |
//! |------------------|-----------------------------------|------------------------------------|
//! | `config`         | merged, replaced, overridden, rendered | Desired configuration         |
//! | `state`          | no (default `merged`)             | Reconciliation state               |
//! | `running_config` | parsed                            | Device text to parse               |
//!
//! # Output data
//!
//! - mutating states: `commands`, `before`, and `after` once commands were
//!   sent (not in check mode). In check mode with diff mode on, the diff is
//!   taken against [`project_after`] instead of gathered facts.
//! - `gathered` / `parsed`: facts under the state's name
//! - `rendered`: the command list under `rendered`

use crate::modules::network::common::{
    clean_show_output, generate_facts_diff, send_config, DeviceTransport,
};
use crate::modules::network::rm::utils::{dict_merge, is_empty};
use crate::modules::network::rm::{generate_commands, OptionDefaults, Resource, RmError, State};
use crate::modules::{Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleResult, ParamExt};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

const KNOWN_PARAMS: &[&str] = &["config", "state", "running_config"];

/// A resource exposed as a module.
pub struct ResourceModule {
    resource: &'static dyn Resource,
}

impl ResourceModule {
    pub fn new(resource: &'static dyn Resource) -> Self {
        Self { resource }
    }

    pub fn resource(&self) -> &'static dyn Resource {
        self.resource
    }

    fn state(params: &ModuleParams) -> ModuleResult<State> {
        match params.get_string("state")? {
            Some(s) => s.parse(),
            None => Ok(State::default()),
        }
    }

    /// Want in normalised form.
    fn want(&self, params: &ModuleParams) -> ModuleResult<Value> {
        let config = params.get("config").unwrap_or(&Value::Null);
        Ok(self.resource.normalizer().normalize(config)?)
    }

    fn transport<'c>(
        &self,
        context: &'c ModuleContext,
        state: State,
    ) -> ModuleResult<&'c Arc<dyn DeviceTransport>> {
        context.transport.as_ref().ok_or_else(|| {
            ModuleError::ExecutionFailed(format!(
                "State '{}' of {} requires a device connection",
                state,
                self.resource.name()
            ))
        })
    }

    /// Read and parse the resource's section of the running config.
    fn gather(&self, transport: &dyn DeviceTransport) -> ModuleResult<Value> {
        let command = self.resource.gather_command();
        debug!(device = %transport.identifier(), command, "Gathering facts");
        let output = transport
            .send(command)
            .map_err(RmError::from)?;
        Ok(self.resource.parse_facts(&clean_show_output(&output)))
    }

    /// Context defaults overlaid with what the device reports.
    fn option_defaults(
        &self,
        context: &ModuleContext,
        transport: Option<&dyn DeviceTransport>,
    ) -> ModuleResult<OptionDefaults> {
        let mut defaults = context.option_defaults.clone();
        if self.resource.uses_defaults() {
            if let Some(transport) = transport {
                let reported = transport
                    .get_option_defaults()
                    .map_err(RmError::from)?;
                defaults.extend(reported);
            }
        }
        Ok(defaults)
    }

    fn reconcile(
        &self,
        params: &ModuleParams,
        context: &ModuleContext,
        state: State,
    ) -> ModuleResult<ModuleOutput> {
        let resource = self.resource;
        let transport = self.transport(context, state)?;

        let before = self.gather(transport.as_ref())?;
        let have = resource.normalizer().normalize(&before)?;
        let want = self.want(params)?;
        let defaults = self.option_defaults(context, Some(transport.as_ref()))?;

        let commands = generate_commands(resource, &want, &have, state, &defaults)?;
        info!(
            module = resource.name(),
            state = %state,
            commands = commands.len(),
            check_mode = context.check_mode,
            "Reconciled"
        );

        if commands.is_empty() {
            return Ok(ModuleOutput::ok("Configuration already matches")
                .with_data("commands", json!([]))
                .with_data("before", before));
        }

        let mut output = if context.check_mode {
            let output = ModuleOutput::changed(format!(
                "{} command(s) would be sent (check mode)",
                commands.len()
            ));
            if context.diff_mode {
                let projected = project_after(resource, &want, &have, state);
                output.with_diff(generate_facts_diff(&before, &projected))
            } else {
                output
            }
        } else {
            send_config(transport.as_ref(), &commands)?;
            let after = self.gather(transport.as_ref())?;
            let output = ModuleOutput::changed(format!("{} command(s) sent", commands.len()));
            let output = if context.diff_mode {
                output.with_diff(generate_facts_diff(&before, &after))
            } else {
                output
            };
            output.with_data("after", after)
        };

        output = output
            .with_data("commands", json!(commands))
            .with_data("before", before);
        Ok(output)
    }
}

/// Facts the device is expected to hold once `want` is applied with `state`.
///
/// Both inputs are in normalised form; the result is in schema form. Used
/// for check-mode diffs, where nothing is sent and `after` cannot be
/// gathered. Platform defaults are not reflected, and deleted entries are
/// dropped whole rather than reduced to their identity.
pub fn project_after(resource: &dyn Resource, want: &Value, have: &Value, state: State) -> Value {
    let normalizer = resource.normalizer();

    let projected = if normalizer.is_keyed() {
        let mut entries = as_map(have);
        let wanted = as_map(want);
        match state {
            State::Merged => {
                for (key, w) in wanted {
                    let merged = match entries.get(&key) {
                        Some(h) => dict_merge(h, &w),
                        None => w,
                    };
                    entries.insert(key, merged);
                }
            }
            State::Replaced => entries.extend(wanted),
            State::Overridden => entries = wanted,
            State::Deleted | State::Purged => {
                if wanted.is_empty() {
                    entries.clear();
                } else {
                    entries.retain(|key, _| !wanted.contains_key(key));
                }
            }
            State::Gathered | State::Parsed | State::Rendered => {}
        }
        Value::Object(entries)
    } else {
        match state {
            State::Merged => dict_merge(have, want),
            State::Replaced | State::Overridden => want.clone(),
            State::Deleted | State::Purged
                if !is_empty(want) && !resource.addresses(want, have) =>
            {
                have.clone()
            }
            State::Deleted | State::Purged => Value::Object(Map::new()),
            State::Gathered | State::Parsed | State::Rendered => have.clone(),
        }
    };

    normalizer.denormalize(&projected)
}

fn as_map(value: &Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    }
}

impl Module for ResourceModule {
    fn name(&self) -> &'static str {
        self.resource.name()
    }

    fn description(&self) -> &'static str {
        self.resource.description()
    }

    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        if let Some(unknown) = params.keys().find(|k| !KNOWN_PARAMS.contains(&k.as_str())) {
            return Err(ModuleError::InvalidParameter(format!(
                "Unsupported parameter '{}' for {}. Valid parameters: {}",
                unknown,
                self.name(),
                KNOWN_PARAMS.join(", ")
            )));
        }

        let state = Self::state(params)?;
        if !self.resource.supported_states().contains(&state) {
            return Err(ModuleError::InvalidParameter(format!(
                "State '{}' is not supported by {}",
                state,
                self.name()
            )));
        }

        match state {
            State::Merged | State::Replaced | State::Overridden | State::Rendered => {
                if params.get("config").map_or(true, Value::is_null) {
                    return Err(ModuleError::MissingParameter(format!(
                        "config (required when state is {})",
                        state
                    )));
                }
            }
            State::Parsed => {
                params.get_string("running_config")?.ok_or_else(|| {
                    ModuleError::MissingParameter(
                        "running_config (required when state is parsed)".to_string(),
                    )
                })?;
            }
            _ => {}
        }

        // Shape errors surface before any device contact
        self.want(params)?;
        Ok(())
    }

    fn execute(
        &self,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let state = Self::state(params)?;
        let resource = self.resource;

        match state {
            State::Parsed => {
                let text = params.get_string_required("running_config")?;
                let facts = resource.parse_facts(&text);
                Ok(ModuleOutput::ok(format!("Parsed {} facts", resource.name()))
                    .with_data("parsed", facts))
            }
            State::Rendered => {
                let want = self.want(params)?;
                let defaults = self.option_defaults(context, None)?;
                let commands = generate_commands(resource, &want, &Value::Null, state, &defaults)?;
                Ok(
                    ModuleOutput::ok(format!("Rendered {} command(s)", commands.len()))
                        .with_data("rendered", json!(commands)),
                )
            }
            State::Gathered => {
                let transport = self.transport(context, state)?;
                let facts = self.gather(transport.as_ref())?;
                Ok(ModuleOutput::ok(format!("Gathered {} facts", resource.name()))
                    .with_data("gathered", facts))
            }
            _ => self.reconcile(params, context, state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::network::common::ReplayTransport;
    use crate::modules::network::nxos::{INTERFACES, VRF_GLOBAL};

    fn params(value: Value) -> ModuleParams {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_validate_params() {
        let module = ResourceModule::new(&INTERFACES);
        assert!(module
            .validate_params(&params(json!({"state": "merged"})))
            .is_err());
        assert!(module
            .validate_params(&params(json!({"state": "parsed"})))
            .is_err());
        assert!(module
            .validate_params(&params(json!({"state": "gathered"})))
            .is_ok());
        assert!(module
            .validate_params(&params(json!({"config": [], "state": "bogus"})))
            .is_err());
        assert!(module
            .validate_params(&params(json!({"config": [], "lines": []})))
            .is_err());
        assert!(module
            .validate_params(&params(json!({"config": ["Ethernet1/1"]})))
            .is_err());
    }

    #[test]
    fn test_mutating_state_needs_transport() {
        let module = ResourceModule::new(&INTERFACES);
        let err = module
            .execute(
                &params(json!({"config": [{"name": "Ethernet1/1"}], "state": "merged"})),
                &ModuleContext::new(),
            )
            .unwrap_err();
        assert!(matches!(err, ModuleError::ExecutionFailed(_)));
    }

    #[test]
    fn test_check_mode_sends_nothing() {
        let transport = Arc::new(
            ReplayTransport::new("leaf1")
                .with_running_config("interface Ethernet1/1\n  description old\n"),
        );
        let context = ModuleContext::new()
            .with_check_mode(true)
            .with_transport(transport.clone());
        let module = ResourceModule::new(&INTERFACES);

        let output = module
            .execute(
                &params(json!({"config": [{"name": "Ethernet1/1", "description": "new"}]})),
                &context,
            )
            .unwrap();

        assert!(output.changed);
        assert_eq!(output.commands(), vec!["interface Ethernet1/1", "description new"]);
        assert!(!output.data.contains_key("after"));
        assert!(output.diff.is_none());
        assert!(transport.config_commands().is_empty());
    }

    #[test]
    fn test_check_mode_diff_uses_projection() {
        let transport = Arc::new(
            ReplayTransport::new("leaf1")
                .with_running_config("vrf context red\n  rd auto\n"),
        );
        let context = ModuleContext::new()
            .with_check_mode(true)
            .with_diff_mode(true)
            .with_transport(transport);
        let module = ResourceModule::new(&VRF_GLOBAL);

        let output = module
            .execute(
                &params(json!({"config": [{"name": "red", "description": "tenant"}]})),
                &context,
            )
            .unwrap();

        let details = output.diff.unwrap().details.unwrap();
        assert!(details.contains("+  description: tenant"));
        assert!(details.contains("   rd: auto"));
    }

    #[test]
    fn test_project_after() {
        let normalizer = VRF_GLOBAL.normalizer();
        let have = normalizer
            .normalize(&json!([{"name": "red", "rd": "auto"}, {"name": "blue", "vni": 10}]))
            .unwrap();
        let want = normalizer
            .normalize(&json!([{"name": "red", "description": "x"}]))
            .unwrap();

        assert_eq!(
            project_after(&VRF_GLOBAL, &want, &have, State::Merged),
            json!([{"name": "red", "rd": "auto", "description": "x"}, {"name": "blue", "vni": 10}])
        );
        assert_eq!(
            project_after(&VRF_GLOBAL, &want, &have, State::Overridden),
            json!([{"name": "red", "description": "x"}])
        );
        assert_eq!(
            project_after(&VRF_GLOBAL, &want, &have, State::Deleted),
            json!([{"name": "blue", "vni": 10}])
        );
    }
}
