//! Resource module engine
//!
//! The declarative reconciliation engine shared by every NX-OS resource
//! module. A resource supplies three things:
//!
//! - an [`RmTemplate`]: an ordered table of [`ParserRule`]s that both parse
//!   running-config text into a fact tree and render attributes back into
//!   CLI commands
//! - a [`Normalizer`]: how list-shaped configuration is keyed so that want
//!   and have can be compared by identity instead of position
//! - a [`Resource`] implementation: which rules to compare per entry and
//!   which context lines wrap them
//!
//! The engine does the rest:
//!
//! ```text
//!  running-config ──► RmTemplate::parse ──► facts ──► Normalizer ──► have ─┐
//!                                                                          ├─► generate_commands ──► [commands]
//!  user config ────────────────────────────────────► Normalizer ──► want ─┘          │
//!                                                                            State::policy()
//! ```
//!
//! Everything here is synchronous and free of shared mutable state; each
//! call to [`generate_commands`] is independent.

pub mod engine;
pub mod normalize;
pub mod parser;
pub mod render;
pub mod state;
pub mod template;
pub mod utils;

pub use engine::{generate_commands, OptionDefaults, Resource, RmEngine};
pub use normalize::{KeySpec, ListSpec, Normalizer};
pub use state::{NegateScope, State, StatePolicy};
pub use template::{Negation, ParserRule, RmTemplate, Setval};

use crate::modules::network::common::TransportError;
use thiserror::Error;

/// Errors raised by the reconciliation engine.
#[derive(Error, Debug)]
pub enum RmError {
    #[error("Unknown parser rule: {0}")]
    UnknownParser(String),

    #[error("Duplicate parser rule: {0}")]
    DuplicateParser(String),

    #[error("Invalid match pattern for rule '{rule}': {source}")]
    Pattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Key template '{0}' rendered empty")]
    EmptyKey(String),

    #[error("Configuration does not match the expected shape at '{path}': {message}")]
    SchemaMismatch { path: String, message: String },

    #[error("{0}")]
    PolicyViolation(String),

    #[error("State '{state}' is not supported by {resource}")]
    UnsupportedState { resource: String, state: State },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Configuration partially applied ({applied} of {total} commands sent): {source}")]
    PartialApply {
        applied: usize,
        total: usize,
        #[source]
        source: TransportError,
    },
}

impl RmError {
    pub(crate) fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        RmError::SchemaMismatch {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for engine operations
pub type RmResult<T> = Result<T, RmError>;
