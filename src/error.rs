//! Error handling for helios-core
//!
//! This module defines the crate error type and a Result alias used
//! throughout the library. The binding firing protocol never returns these
//! to trigger callers; they surface from configuration, persistence and
//! explicit graph operations.

use thiserror::Error;

/// Main error type for helios-core operations
#[derive(Error, Debug)]
pub enum HeliosError {
    /// Errors raised while compiling or evaluating binding scripts
    #[error("Script error: {0}")]
    Script(String),

    /// Errors related to settings loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed profile XML
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Profile written by a format version this build cannot read
    #[error("Unsupported profile version: {0}")]
    UnsupportedVersion(String),

    /// A reference string that cannot be parsed or resolved
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// A handle whose target has been destroyed
    #[error("Dead reference: {0}")]
    DeadReference(String),

    /// A type identifier missing from the component registry
    #[error("Unknown component type: {0}")]
    UnknownComponent(String),

    /// Errors raised by action handlers or binding operations
    #[error("Binding error: {0}")]
    Binding(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<HeliosError>,
    },
}

impl HeliosError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        HeliosError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a script error from a Rhai error
    pub fn from_rhai_error(err: Box<rhai::EvalAltResult>) -> Self {
        HeliosError::Script(err.to_string())
    }
}

impl From<rhai::ParseError> for HeliosError {
    fn from(err: rhai::ParseError) -> Self {
        HeliosError::Script(format!("Compilation error: {}", err))
    }
}

/// Result type alias for helios-core operations
pub type Result<T> = std::result::Result<T, HeliosError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, Box<rhai::EvalAltResult>> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| HeliosError::from_rhai_error(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| HeliosError::from_rhai_error(e).with_context(f()))
    }
}
