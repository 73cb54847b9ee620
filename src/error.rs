//! Error types for nxresource.
//!
//! Library layers have their own error enums ([`RmError`] for the engine,
//! [`ModuleError`] for modules, [`TransportError`] for device sessions).
//! This is the application-level error: loading task files and
//! configuration, and looking modules up.
//!
//! [`RmError`]: crate::modules::network::rm::RmError
//! [`TransportError`]: crate::modules::network::TransportError

use crate::modules::ModuleError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for nxresource operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for nxresource.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Task Errors
    // ========================================================================
    /// Error loading a task file.
    #[error("Failed to load task file '{path}': {message}")]
    TaskLoad {
        /// Path to the task file
        path: PathBuf,
        /// Error message
        message: String,
        /// Source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Task file is well-formed but not usable.
    #[error("Task validation failed: {0}")]
    TaskValidation(String),

    // ========================================================================
    // Module Errors
    // ========================================================================
    /// Module not found.
    #[error("Module '{0}' not found")]
    ModuleNotFound(String),

    /// Module execution failed.
    #[error("Module '{module}' failed: {source}")]
    Module {
        /// Module name
        module: String,
        /// Underlying module error
        #[source]
        source: ModuleError,
    },

    // ========================================================================
    // Configuration and IO Errors
    // ========================================================================
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Generic error with source.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
        /// Source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Creates a new task load error.
    pub fn task_load(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::TaskLoad {
            path: path.into(),
            message: message.into(),
            source,
        }
    }

    /// Wraps a module error with the module's name.
    pub fn module(module: impl Into<String>, source: ModuleError) -> Self {
        match source {
            ModuleError::NotFound(name) => Self::ModuleNotFound(name),
            source => Self::Module {
                module: module.into(),
                source,
            },
        }
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Module { .. } => 2,
            Error::TaskLoad { .. } | Error::TaskValidation(_) | Error::FileNotFound(_) => 4,
            Error::ModuleNotFound(_) => 5,
            Error::Config(_) | Error::TomlParse(_) => 6,
            _ => 1,
        }
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Adds context with a closure that is only evaluated on error.
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Other {
            message: message.into(),
            source: Some(Box::new(e)),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| Error::Other {
            message: f().into(),
            source: Some(Box::new(e)),
        })
    }
}
