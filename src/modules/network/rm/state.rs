//! Reconciliation states and their policies

use crate::modules::ModuleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Requested reconciliation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// Add or update what want names; never remove
    #[default]
    Merged,
    /// Make each addressed entry match want exactly
    Replaced,
    /// Make the whole resource match want exactly
    Overridden,
    /// Remove the attributes of addressed entries (all entries if none given)
    Deleted,
    /// Remove addressed entries (all if none given) entirely
    Purged,
    /// Read facts from the device
    Gathered,
    /// Parse supplied running-config text into facts
    Parsed,
    /// Render commands for want without contacting a device
    Rendered,
}

impl State {
    pub const ALL: &'static [State] = &[
        State::Merged,
        State::Replaced,
        State::Overridden,
        State::Deleted,
        State::Purged,
        State::Gathered,
        State::Parsed,
        State::Rendered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            State::Merged => "merged",
            State::Replaced => "replaced",
            State::Overridden => "overridden",
            State::Deleted => "deleted",
            State::Purged => "purged",
            State::Gathered => "gathered",
            State::Parsed => "parsed",
            State::Rendered => "rendered",
        }
    }

    /// Decision table for this state.
    pub fn policy(&self) -> StatePolicy {
        use NegateScope as N;
        let (reads_device, merge_want, negate_scope, clear_want, remove_container, generates) =
            match self {
                State::Merged => (true, true, N::None, false, false, true),
                State::Replaced => (true, false, N::Addressed, false, false, true),
                State::Overridden => (true, false, N::Global, false, false, true),
                State::Deleted => (true, false, N::Addressed, true, false, true),
                State::Purged => (true, false, N::Addressed, true, true, true),
                State::Gathered => (true, false, N::None, false, false, false),
                State::Parsed => (false, false, N::None, false, false, false),
                State::Rendered => (false, true, N::None, false, false, true),
            };
        StatePolicy {
            reads_device,
            writes_device: generates && reads_device,
            merge_want,
            negate_scope,
            clear_want,
            remove_container,
            generates_commands: generates,
        }
    }

    /// Whether this state may change device configuration.
    pub fn is_mutating(&self) -> bool {
        self.policy().writes_device
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for State {
    type Err = ModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "merged" => Ok(State::Merged),
            "replaced" => Ok(State::Replaced),
            "overridden" => Ok(State::Overridden),
            "deleted" => Ok(State::Deleted),
            "purged" => Ok(State::Purged),
            "gathered" => Ok(State::Gathered),
            "parsed" => Ok(State::Parsed),
            "rendered" => Ok(State::Rendered),
            _ => Err(ModuleError::InvalidParameter(format!(
                "Invalid state '{}'. Valid states: merged, replaced, overridden, deleted, purged, gathered, parsed, rendered",
                s
            ))),
        }
    }
}

/// Which have-only attributes a state removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegateScope {
    /// Nothing is removed
    None,
    /// Only within entries want addresses
    Addressed,
    /// Anywhere in the resource
    Global,
}

/// What a state does, as consumed by the engine and module wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatePolicy {
    /// Current configuration is read from the device
    pub reads_device: bool,
    /// Generated commands are sent to the device
    pub writes_device: bool,
    /// Want is laid over have before comparison
    pub merge_want: bool,
    pub negate_scope: NegateScope,
    /// Want only addresses entries; its attribute values are ignored
    pub clear_want: bool,
    /// Addressed entries are removed as whole containers
    pub remove_container: bool,
    /// The state produces a command list
    pub generates_commands: bool,
}
