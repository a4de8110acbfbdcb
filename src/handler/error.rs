//! Failure values raised by hooks, handlers and resolvers.

use std::any::Any;
use thiserror::Error;

/// A failure raised somewhere inside the dispatch pipeline.
///
/// The `Display` rendering is what the default error response reports after
/// its `500 - ` prefix, so `FezzError::new("boom")` renders as `boom`.
#[derive(Debug, Error)]
pub enum FezzError {
    /// A failure raised by a hook or handler.
    #[error("{0}")]
    Message(String),

    /// The resolver could not produce a match result.
    #[error("route resolution failed: {0}")]
    Resolve(String),

    /// The request URL could not be parsed.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// A hook, handler or resolver panicked.
    #[error("panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FezzError {
    /// Create a new FezzError from a message.
    pub fn new(message: impl Into<String>) -> Self {
        FezzError::Message(message.into())
    }

    /// Create a resolution failure.
    pub fn resolve(message: impl Into<String>) -> Self {
        FezzError::Resolve(message.into())
    }

    /// Convert a caught panic payload into a failure value.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        FezzError::Panicked(message)
    }
}

impl From<String> for FezzError {
    fn from(message: String) -> Self {
        FezzError::Message(message)
    }
}

impl From<&str> for FezzError {
    fn from(message: &str) -> Self {
        FezzError::Message(message.to_string())
    }
}
