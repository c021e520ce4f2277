//! Error handling for nodescript-rs
//!
//! This module defines the crate-level error type and a Result alias used by
//! the configuration loader, the host loop and the command line front end.
//! Graph edits and the sandbox have their own narrower error enums which
//! convert into [`NodeScriptError`].

use crate::graph::GraphError;
use crate::sandbox::SandboxError;
use thiserror::Error;

/// Main error type for nodescript-rs operations
#[derive(Error, Debug)]
pub enum NodeScriptError {
    /// Errors raised while editing a graph
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Errors raised by the sandbox executor
    #[error("Sandbox error: {0}")]
    Sandbox(#[from] SandboxError),

    /// Errors related to Rhai script compilation or execution
    #[error("Script error: {0}")]
    Script(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication with the sandbox thread
    #[error("Channel error: {0}")]
    Channel(String),

    /// The sandbox did not answer within the host's timeout
    #[error("Timeout: {0}")]
    Timeout(String),

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
        source: Box<NodeScriptError>,
    },
}

impl NodeScriptError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        NodeScriptError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl From<serde_json::Error> for NodeScriptError {
    fn from(err: serde_json::Error) -> Self {
        NodeScriptError::Serialization(err.to_string())
    }
}

/// Result type alias for nodescript-rs operations
pub type Result<T> = std::result::Result<T, NodeScriptError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<NodeScriptError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| Into::<NodeScriptError>::into(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| Into::<NodeScriptError>::into(e).with_context(f()))
    }
}
