//! Error types for parameter parsing, typed access and physics dispatch.

use crate::value::ValueKind;

/// Failure to turn a string into a value of a given kind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// A numeric token could not be parsed
    #[error("value [{token}] is not a valid {kind}")]
    InvalidNumber { kind: ValueKind, token: String },

    /// A vector-like value had the wrong number of non-empty tokens
    #[error("expected {expected} components to parse into a {kind}, found {found}")]
    WrongComponentCount {
        kind: ValueKind,
        expected: usize,
        found: usize,
    },

    #[error("value [{0}] is not a valid bool")]
    InvalidBool(String),

    #[error("value [{0}] is not a single char")]
    InvalidChar(String),

    /// Unrecognized type tag
    #[error("unknown parameter type [{0}]")]
    UnknownKind(String),
}

/// Errors raised by parameter handles, the value slot and the physics dispatcher.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("parameter [{key}]: {source}")]
    Parse {
        key: String,
        #[source]
        source: ParseError,
    },

    /// Typed access through an accessor that does not match the stored tag
    #[error("parameter [{key}] is a [{actual}], attempting to access as a [{expected}]")]
    TypeMismatch {
        key: String,
        expected: ValueKind,
        actual: ValueKind,
    },

    #[error("unknown parameter [{key}] in physics engine {engine}")]
    UnknownKey { key: String, engine: String },

    /// Element lookup by attribute or child name failed
    #[error("element <{element}> has no attribute or child [{key}]")]
    NotFound { element: String, key: String },

    #[error("parameter [{0}] is read-only")]
    ReadOnlyField(String),

    /// Update message entry carrying neither a type nor a populated value
    #[error("empty parameter entry [{0}] in physics message")]
    IncompleteMessageEntry(String),

    #[error("failed to decode message: {0}")]
    Decode(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T, E = ParamError> = std::result::Result<T, E>;
