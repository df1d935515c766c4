//! Error types for the transport crate.

use thiserror::Error;

use crate::message::PayloadKind;

/// Errors that can occur when wiring publishers and subscribers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The topic name is not a valid graph name.
    #[error("invalid topic name {name:?}: {reason}")]
    InvalidTopic {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A topic is already in use with a different payload kind.
    #[error("topic {topic} carries {existing}, cannot use it for {requested}")]
    KindMismatch {
        /// The topic.
        topic: String,
        /// Kind already registered on the topic.
        existing: PayloadKind,
        /// Kind requested by the caller.
        requested: PayloadKind,
    },

    /// Queue depth must be at least one.
    #[error("queue depth must be at least 1")]
    ZeroDepth,

    /// The spinner thread could not be started.
    #[error("failed to spawn spinner thread: {0}")]
    Spawn(String),
}

impl TransportError {
    /// Create an invalid topic error.
    #[must_use]
    pub fn invalid_topic(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidTopic {
            name: name.into(),
            reason,
        }
    }
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
