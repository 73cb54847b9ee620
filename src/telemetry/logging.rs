//! Structured logging layer using the tracing crate.
//!
//! Events go to stderr so that command output on stdout stays parseable.

use crate::error::{Error, Result};
use crate::telemetry::config::{LogFormat, LogLevel, LoggingConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Builder for the global logging subscriber.
#[derive(Debug, Clone, Default)]
pub struct LoggingBuilder {
    config: LoggingConfig,
}

impl LoggingBuilder {
    /// Create a new logging builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder from an existing configuration.
    pub fn from_config(config: LoggingConfig) -> Self {
        Self { config }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn with_ansi(mut self, enabled: bool) -> Self {
        self.config.ansi_colors = enabled;
        self
    }

    pub fn with_target(mut self, enabled: bool) -> Self {
        self.config.with_target = enabled;
        self
    }

    pub fn with_file(mut self, enabled: bool) -> Self {
        self.config.with_file = enabled;
        self
    }

    /// Set filter directive.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.filter = Some(filter.into());
        self
    }

    /// Build and install the global subscriber.
    pub fn init(self) -> Result<()> {
        let env_filter = self.build_filter();
        let config = self.config;

        let installed = match config.format {
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr)
                        .with_ansi(config.ansi_colors)
                        .with_target(config.with_target)
                        .with_file(config.with_file)
                        .with_line_number(config.with_file),
                )
                .try_init(),
            LogFormat::Compact => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_writer(std::io::stderr)
                        .with_ansi(config.ansi_colors)
                        .with_target(config.with_target)
                        .with_file(config.with_file)
                        .with_line_number(config.with_file),
                )
                .try_init(),
            LogFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(config.with_target)
                        .with_file(config.with_file)
                        .with_line_number(config.with_file),
                )
                .try_init(),
        };

        installed.map_err(|e| Error::Config(e.to_string()))
    }

    /// `RUST_LOG` first, then the configured directive, then the level.
    fn build_filter(&self) -> EnvFilter {
        let default_filter = self.config.level.as_str();

        if let Some(ref filter) = self.config.filter {
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(filter))
                .unwrap_or_else(|_| EnvFilter::new(default_filter))
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
        }
    }
}

/// Install logging from configuration, raised by CLI verbosity.
///
/// `-v` flags only ever make logging more verbose than the configured level.
pub fn init_logging(config: &LoggingConfig, verbosity: u8) -> Result<()> {
    let mut config = config.clone();
    if verbosity > 0 {
        config.level = config.level.min(LogLevel::from_verbosity(verbosity));
        config.with_target |= verbosity >= 2;
        config.with_file |= verbosity >= 3;
    }
    LoggingBuilder::from_config(config).init()
}

/// Install default logging for a verbosity level.
pub fn init_from_verbosity(verbosity: u8) -> Result<()> {
    init_logging(&LoggingConfig::default(), verbosity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_builder() {
        let builder = LoggingBuilder::new()
            .with_level(LogLevel::Debug)
            .with_format(LogFormat::Json)
            .with_ansi(false)
            .with_target(true);

        assert_eq!(builder.config.level, LogLevel::Debug);
        assert_eq!(builder.config.format, LogFormat::Json);
        assert!(!builder.config.ansi_colors);
        assert!(builder.config.with_target);
    }

    #[test]
    fn test_production_config() {
        let builder = LoggingBuilder::from_config(LoggingConfig::production());
        assert_eq!(builder.config.format, LogFormat::Json);
        assert_eq!(builder.config.filter.as_deref(), Some("nxresource=info,warn"));
    }
}
