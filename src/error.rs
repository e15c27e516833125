//! Error types
//!
//! `ApiError` is the crate-wide error. `ProtocolError` is what a protocol
//! implementation reports from a link or unlink call; the linking engine logs
//! it and moves on, it never crosses an attribute-group boundary.

use crate::asset::AttributeRef;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// A registered protocol reports an empty name
    #[error("Protocol can't have an empty name: {type_name}")]
    EmptyProtocolName { type_name: String },

    #[error("Protocol already registered: {0}")]
    DuplicateProtocol(String),

    #[error("Attribute has an invalid agent link: {attribute}")]
    InvalidAgentLink { attribute: AttributeRef },

    #[error("Attribute {attribute} is not attached to an asset")]
    MissingReference { attribute: String },

    #[error("Invalid change snapshot: {0}")]
    Snapshot(String),

    #[error("Asset store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Io(err.to_string())
    }
}

/// Failure raised by a protocol while linking or unlinking attributes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Protocol rejected the request: {0}")]
    Rejected(String),

    #[error("Protocol I/O failure: {0}")]
    Io(String),

    #[error("Unsupported by protocol: {0}")]
    Unsupported(String),
}
