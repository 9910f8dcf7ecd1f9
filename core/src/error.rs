//! Error types for the RapidCoin client.
//!
//! # Design
//! Only problems found before any I/O are returned as `Err`: a request that
//! fails its schema (`Validation`) or cannot be encoded (`Serialization`).
//! Remote and transport failures are data, carried by
//! `ApiResult::Failure`. `Failure` and `Deserialization` appear only when a
//! caller asks `ApiResult::decode` for a typed view of the payload.

use std::fmt;

use thiserror::Error;

use crate::result::FailureEnvelope;

/// The schema rule a field broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Required field is absent.
    Required,
    /// String field is present but empty.
    NotEmpty,
    /// Number must be strictly greater than zero.
    Positive,
    /// String must be an absolute URI with a scheme and a host.
    Uri,
    /// Identifier must be a version-4 UUID.
    UuidV4,
    /// Value must be one of the listed codes.
    OneOf(&'static [&'static str]),
    /// Field is not part of the schema.
    UnknownField,
    /// Value has the wrong JSON shape.
    Malformed(String),
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Required => write!(f, "is required"),
            Rule::NotEmpty => write!(f, "must not be empty"),
            Rule::Positive => write!(f, "must be greater than 0"),
            Rule::Uri => write!(f, "must be a valid uri"),
            Rule::UuidV4 => write!(f, "must be a valid uuid v4"),
            Rule::OneOf(allowed) => write!(f, "must be one of [{}]", allowed.join(", ")),
            Rule::UnknownField => write!(f, "is not allowed"),
            Rule::Malformed(msg) => write!(f, "is malformed: {msg}"),
        }
    }
}

/// A request parameter failed its schema. Raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("\"{field}\" {rule}")]
pub struct ValidationError {
    pub field: String,
    pub rule: Rule,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, rule: Rule) -> Self {
        Self {
            field: field.into(),
            rule,
        }
    }
}

/// Errors returned by `RapidCoinClient` operations and `ApiResult::decode`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The input failed validation; nothing was sent.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The service (or the transport) reported a failure.
    #[error("request failed: {0}")]
    Failure(FailureEnvelope),

    /// A success payload did not match the requested type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

/// Why a request produced no HTTP response at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    HostNotFound,
    ConnectionFailed,
    Io,
    Other,
}

impl TransportErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::HostNotFound => "host_not_found",
            TransportErrorKind::ConnectionFailed => "connection_failed",
            TransportErrorKind::Io => "io",
            TransportErrorKind::Other => "other",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised by a `Transport` when no response could be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}
