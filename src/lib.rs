//! # nxresource - Declarative NX-OS Resource Modules
//!
//! nxresource turns the running configuration of a Cisco NX-OS device into
//! structured facts, compares those facts with a desired configuration,
//! and renders the minimal ordered list of CLI commands that reconciles the
//! two.
//!
//! ## Core Concepts
//!
//! - **Want / have**: the desired configuration and the device's current
//!   configuration, both as fact trees
//! - **Resources**: one configuration area (interfaces, VRFs, BGP, NTP) with
//!   its own parser table and comparison rules
//! - **Parser rules**: a regex that recognises a line, a result template
//!   that turns its captures into facts, and a setval template that renders
//!   facts back into a command
//! - **States**: how want is applied to have (`merged`, `replaced`,
//!   `overridden`, `deleted`, `purged`) or which read-only view is produced
//!   (`gathered`, `parsed`, `rendered`)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           CLI Interface                              │
//! │              (clap-based: parse / render / plan / list)              │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                  Module Registry (ResourceModule)                    │
//! │          parameters, state dispatch, check mode, diff mode           │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!          ┌─────────────────────────┼─────────────────────────┐
//!          ▼                         ▼                         ▼
//! ┌─────────────────┐   ┌─────────────────────┐   ┌─────────────────────┐
//! │     Parser      │   │     Normalizer      │   │       Engine        │
//! │ (rule tables +  │   │ (lists keyed by     │   │ (compare, context,  │
//! │  minijinja)     │   │  identity)          │   │  state policies)    │
//! └─────────────────┘   └─────────────────────┘   └─────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                  DeviceTransport (show / configure)                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust
//! use nxresource::prelude::*;
//! use serde_json::json;
//!
//! let resource = nxos::find("nxos_interfaces").unwrap();
//! let normalizer = resource.normalizer();
//!
//! let have = resource.parse_facts("interface Ethernet1/1\n  description old\n");
//! let want = json!([{"name": "Ethernet1/1", "description": "new"}]);
//!
//! let commands = generate_commands(
//!     resource,
//!     &normalizer.normalize(&want).unwrap(),
//!     &normalizer.normalize(&have).unwrap(),
//!     State::Merged,
//!     &OptionDefaults::new(),
//! )
//! .unwrap();
//! assert_eq!(commands, vec!["interface Ethernet1/1", "description new"]);
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    // Error handling
    pub use crate::error::{Error, Result};

    // Module system
    pub use crate::modules::{
        Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleRegistry,
        ModuleResult,
    };

    // Resource engine
    pub use crate::modules::network::nxos;
    pub use crate::modules::network::rm::{
        generate_commands, OptionDefaults, Resource, RmEngine, RmError, RmResult, RmTemplate,
        State,
    };

    // Device access
    pub use crate::modules::network::{DeviceTransport, ReplayTransport, TransportError};

    // Tasks
    pub use crate::task::ResourceTask;
}

/// Error types and result aliases for application-level operations.
pub mod error;

/// Configuration loading: files, then environment overrides.
pub mod config;

/// Resource modules, the reconciliation engine, and device transports.
///
/// The engine lives in [`modules::network::rm`]; the NX-OS resources built
/// on it in [`modules::network::nxos`].
pub mod modules;

/// Task files naming a module, a state and a configuration.
pub mod task;

/// Structured logging.
pub mod telemetry;

/// Crate version string.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
