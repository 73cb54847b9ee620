//! Reconciliation engine
//!
//! Compares normalised want and have trees and accumulates the CLI commands
//! that move the device from one to the other.

use super::normalize::Normalizer;
use super::state::{NegateScope, State, StatePolicy};
use super::template::RmTemplate;
use super::utils::{dict_merge, get_from_dict, is_empty};
use super::{RmError, RmResult};
use serde_json::{json, Map, Value};
use std::borrow::Cow;
use tracing::{debug, info};

/// Platform defaults that depend on device-wide settings (for example
/// whether switchports default to layer 2 and shut). Fetched once per run.
pub type OptionDefaults = Map<String, Value>;

// ============================================================================
// Resource trait
// ============================================================================

/// One network resource: its parser table, its normalisation plan, and how
/// a single entry is compared.
pub trait Resource: Send + Sync {
    /// Module name, e.g. `nxos_interfaces`
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn template(&self) -> &RmTemplate;

    fn normalizer(&self) -> Normalizer;

    /// Show command whose output feeds the parser
    fn gather_command(&self) -> &'static str;

    fn supported_states(&self) -> &'static [State] {
        State::ALL
    }

    /// Whether comparisons need [`OptionDefaults`] from the device
    fn uses_defaults(&self) -> bool {
        false
    }

    /// Reshape the raw parse tree before it is presented as facts.
    fn post_parse(&self, parsed: Value) -> Value {
        parsed
    }

    /// Expand aliases on one normalised entry. Applied to want and have.
    fn prepare(&self, _entry: &mut Value) {}

    /// Whether a non-empty want names the running entry of a single-entry
    /// resource. `deleted` and `purged` leave an unnamed entry alone.
    fn addresses(&self, _want: &Value, _have: &Value) -> bool {
        true
    }

    /// Reject want/have combinations the resource cannot reconcile.
    fn validate(&self, _want: &Value, _have: &Value, _state: State) -> RmResult<()> {
        Ok(())
    }

    /// Emit the commands reconciling one entry. Either side may be `{}`.
    fn compare_entry(&self, rm: &mut RmEngine<'_>, want: &Value, have: &Value) -> RmResult<()>;

    /// Emit the commands removing one entry entirely.
    fn purge_entry(&self, _rm: &mut RmEngine<'_>, _have: &Value) -> RmResult<()> {
        Err(RmError::UnsupportedState {
            resource: self.name().to_string(),
            state: State::Purged,
        })
    }

    /// Parse running-config text into facts (schema form).
    fn parse_facts(&self, text: &str) -> Value {
        let parsed = self.post_parse(self.template().parse(text));
        // Parser grouping keys are discarded; natural keys are rebuilt on normalize
        self.normalizer().denormalize(&parsed)
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Command accumulator for one reconciliation run.
pub struct RmEngine<'a> {
    tmplt: &'a RmTemplate,
    state: State,
    defaults: &'a OptionDefaults,
    commands: Vec<String>,
}

impl<'a> RmEngine<'a> {
    pub fn new(tmplt: &'a RmTemplate, state: State, defaults: &'a OptionDefaults) -> Self {
        Self {
            tmplt,
            state,
            defaults,
            commands: Vec::new(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn defaults(&self) -> &OptionDefaults {
        self.defaults
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<String> {
        self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Render and append one command.
    pub fn addcmd(&mut self, data: &Value, parser: &str, negate: bool) -> RmResult<()> {
        let command = self.tmplt.render(data, parser, negate)?;
        if command.is_empty() {
            debug!(parser, "Rendered empty command, skipping");
            return Ok(());
        }
        debug!(parser, negate, command = %command, "Adding command");
        self.commands.push(command);
        Ok(())
    }

    /// Compare scalar attributes named by `parsers`.
    ///
    /// A want value that differs from have is rendered from want; a value
    /// only have carries is rendered negated from have. Booleans render
    /// through negation: a false want negates, a false have restores.
    pub fn compare(&mut self, parsers: &[&str], want: &Value, have: &Value) -> RmResult<()> {
        for parser in parsers {
            let path = self.tmplt.require(parser)?.compare_path();
            let w = get_from_dict(want, path);
            let h = get_from_dict(have, path);

            match (w, h) {
                (Some(w), h) if Some(w) != h => {
                    let negate = matches!(w, Value::Bool(false));
                    self.addcmd(want, parser, negate)?;
                }
                (None, Some(h)) => {
                    let negate = match h {
                        Value::Bool(b) => *b,
                        _ => true,
                    };
                    self.addcmd(have, parser, negate)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Keyed sub-diff of one list attribute.
    ///
    /// Each want element that differs from the same-keyed have element is
    /// added; each have element left without a want counterpart is removed.
    /// Scalar elements are rendered with the element bound to `item`.
    pub fn compare_list(&mut self, parser: &str, want: &Value, have: &Value) -> RmResult<()> {
        let path = self.tmplt.require(parser)?.compare_path();
        let empty = Map::new();
        let wantd = get_from_dict(want, path).and_then(Value::as_object).unwrap_or(&empty);
        let mut haved = get_from_dict(have, path)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        for (key, w) in wantd {
            let h = haved.shift_remove(key);
            if h.as_ref() != Some(w) {
                self.addcmd(&item_data(w), parser, false)?;
            }
        }
        for h in haved.values() {
            self.addcmd(&item_data(h), parser, true)?;
        }
        Ok(())
    }

    /// Run `body` and, if it emitted anything, insert the context-entry
    /// command rendered from `entry` in front of its output.
    ///
    /// Returns whether the context was entered.
    pub fn context<F>(&mut self, entry: &Value, parser: &str, body: F) -> RmResult<bool>
    where
        F: FnOnce(&mut Self) -> RmResult<()>,
    {
        let begin = self.commands.len();
        body(self)?;
        if self.commands.len() == begin {
            return Ok(false);
        }
        let command = self.tmplt.render(entry, parser, false)?;
        if command.is_empty() {
            return Err(RmError::schema(
                parser,
                "context entry could not be rendered for emitted commands",
            ));
        }
        self.commands.insert(begin, command);
        Ok(true)
    }

    /// Move commands at or after `from` that start with any of `prefixes`
    /// to the end, keeping relative order.
    pub fn move_to_end(&mut self, from: usize, prefixes: &[&str]) {
        if from >= self.commands.len() {
            return;
        }
        let tail = self.commands.split_off(from);
        let (moved, kept): (Vec<_>, Vec<_>) = tail
            .into_iter()
            .partition(|cmd| prefixes.iter().any(|p| cmd.starts_with(p)));
        self.commands.extend(kept);
        self.commands.extend(moved);
    }
}

fn item_data(value: &Value) -> Cow<'_, Value> {
    if value.is_object() {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(json!({ "item": value }))
    }
}

// ============================================================================
// Entry point
// ============================================================================

/// Generate the ordered command list reconciling `have` to `want`.
///
/// Both trees are in normalised (keyed) form. Read-only states produce no
/// commands; states the resource does not support are rejected before
/// anything is compared.
pub fn generate_commands(
    resource: &dyn Resource,
    want: &Value,
    have: &Value,
    state: State,
    defaults: &OptionDefaults,
) -> RmResult<Vec<String>> {
    if !resource.supported_states().contains(&state) {
        return Err(RmError::UnsupportedState {
            resource: resource.name().to_string(),
            state,
        });
    }

    let policy = state.policy();
    if !policy.generates_commands {
        return Ok(Vec::new());
    }

    let mut want = object_or_empty(want);
    let mut have = if policy.reads_device {
        object_or_empty(have)
    } else {
        Value::Object(Map::new())
    };

    let keyed = resource.normalizer().is_keyed();
    for tree in [&mut want, &mut have] {
        if keyed {
            if let Value::Object(entries) = tree {
                entries.values_mut().for_each(|entry| resource.prepare(entry));
            }
        } else {
            resource.prepare(tree);
        }
    }

    resource.validate(&want, &have, state)?;

    let mut rm = RmEngine::new(resource.template(), state, defaults);
    if keyed {
        reconcile_keyed(resource, &mut rm, want, have, policy)?;
    } else {
        reconcile_single(resource, &mut rm, want, have, policy)?;
    }

    let commands = rm.into_commands();
    info!(
        resource = resource.name(),
        state = %state,
        count = commands.len(),
        "Generated commands"
    );
    Ok(commands)
}

fn object_or_empty(value: &Value) -> Value {
    match value {
        Value::Object(_) => value.clone(),
        _ => Value::Object(Map::new()),
    }
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn reconcile_keyed(
    resource: &dyn Resource,
    rm: &mut RmEngine<'_>,
    want: Value,
    have: Value,
    policy: StatePolicy,
) -> RmResult<()> {
    let empty = Value::Object(Map::new());
    let mut wantd = into_map(want);
    let mut haved = into_map(have);

    if policy.merge_want {
        for (key, w) in wantd.iter_mut() {
            if let Some(h) = haved.get(key) {
                *w = dict_merge(h, w);
            }
        }
    }

    if policy.clear_want {
        // An empty want addresses every entry
        if !wantd.is_empty() {
            haved.retain(|key, _| wantd.contains_key(key));
        }
        if policy.remove_container {
            for h in haved.values() {
                resource.purge_entry(rm, h)?;
            }
            return Ok(());
        }
        wantd.clear();
    }

    if policy.negate_scope == NegateScope::Global || policy.clear_want {
        for (key, h) in haved.iter() {
            if !wantd.contains_key(key) {
                resource.compare_entry(rm, &empty, h)?;
            }
        }
    }

    for (key, w) in wantd.iter() {
        let h = haved.get(key).unwrap_or(&empty);
        resource.compare_entry(rm, w, h)?;
    }
    Ok(())
}

fn reconcile_single(
    resource: &dyn Resource,
    rm: &mut RmEngine<'_>,
    want: Value,
    have: Value,
    policy: StatePolicy,
) -> RmResult<()> {
    if policy.clear_want && !is_empty(&want) && !resource.addresses(&want, &have) {
        debug!(
            resource = resource.name(),
            "Configuration names another instance, nothing to remove"
        );
        return Ok(());
    }

    if policy.remove_container {
        if !is_empty(&have) {
            resource.purge_entry(rm, &have)?;
        }
        return Ok(());
    }

    let want = if policy.clear_want {
        Value::Object(Map::new())
    } else if policy.merge_want {
        dict_merge(&have, &want)
    } else {
        want
    };

    if is_empty(&want) && is_empty(&have) {
        return Ok(());
    }
    resource.compare_entry(rm, &want, &have)
}
