//! Bridge error types

use thiserror::Error;

/// Bridge-related errors
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Incoming bytes are not a valid method call
    #[error("Malformed method call: {0}")]
    MalformedCall(String),

    /// Reply bytes are not a valid result envelope
    #[error("Malformed reply envelope: {0}")]
    MalformedEnvelope(String),

    /// JSON encoding or decoding failed
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// A value has no representation in the channel's wire format
    #[error("Value cannot be encoded: {0}")]
    Unencodable(String),

    /// The OS UI mode service could not be queried
    #[error("UI mode service unavailable: {0}")]
    ServiceUnavailable(String),

    /// A handler did not resolve its result channel before returning
    #[error("No reply received on channel '{0}'")]
    ReplyPending(String),

    /// Configuration could not be parsed or serialized
    #[error("Config error: {0}")]
    Config(String),

    /// I/O failure while reading configuration
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Operation not supported on this OS
    #[error("Platform not supported: {0}")]
    Unsupported(String),
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;
