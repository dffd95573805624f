//! Error types for routing and configuration.

use thiserror::Error;

/// Errors surfaced by [`Router::enqueue`](crate::Router::enqueue) and
/// [`Router::next`](crate::Router::next).
#[derive(Debug, Error)]
pub enum RouterError {
    /// Inbound text is not a JSON object.
    #[error("failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),

    /// A transformed message could not be written back to JSON.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// `next` was called on a queue with nothing pending.
    #[error("queue {0} is empty")]
    EmptyQueue(usize),

    /// Queue index outside the fixed queue range.
    #[error("queue index {index} is out of range (0..{count})")]
    InvalidQueue { index: usize, count: usize },

    /// The configured digest algorithm cannot be constructed.
    #[error("digest algorithm '{0}' is unavailable")]
    DigestUnavailable(String),

    /// `_hash` names a field that is missing or not text.
    #[error("cannot hash field '{field}': {reason}")]
    HashTarget { field: String, reason: &'static str },
}

impl RouterError {
    /// True for the empty-queue condition, which callers are expected to handle.
    pub fn is_empty_queue(&self) -> bool {
        matches!(self, RouterError::EmptyQueue(_))
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
