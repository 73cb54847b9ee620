//! Telemetry for nxresource.
//!
//! Structured logging through the `tracing` crate. Library code only emits
//! events (`debug!` for skipped lines and emitted commands, `info!` for
//! per-run summaries, `warn!` for partial applies); the binary installs a
//! subscriber once at startup with [`init_logging`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use nxresource::telemetry::{LogFormat, LoggingBuilder, LogLevel};
//!
//! LoggingBuilder::new()
//!     .with_level(LogLevel::Debug)
//!     .with_format(LogFormat::Json)
//!     .init()?;
//!
//! tracing::info!(module = "nxos_interfaces", "Reconciled");
//! ```

pub mod config;
pub mod logging;

pub use config::{LogFormat, LogLevel, LoggingConfig};
pub use logging::{init_from_verbosity, init_logging, LoggingBuilder};
