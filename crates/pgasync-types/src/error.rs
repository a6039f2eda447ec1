//! Value conversion error types.

use thiserror::Error;

use crate::oid::Oid;

/// Errors that can occur while converting between wire payloads and host values.
///
/// None of these are retried by the codec. They surface to the query layer,
/// which decides whether to fail the statement or the connection.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConversionError {
    /// The OID has no built-in decoder and no custom converter accepts it.
    #[error("unsupported type: {0}")]
    UnsupportedType(Oid),

    /// The element OID of an array cannot be decoded.
    #[error("unsupported array element type: {0}")]
    UnsupportedArrayElement(Oid),

    /// No built-in rule and no registered converter handles this host type.
    #[error("unknown conversion target: {0}")]
    UnknownTarget(String),

    /// The payload does not parse under the rules of its OID.
    #[error("malformed {oid} payload: {reason}")]
    MalformedPayload {
        /// OID the payload was decoded as.
        oid: Oid,
        /// What was wrong with it.
        reason: String,
    },

    /// A value had a different shape than the one requested.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type name.
        expected: &'static str,
        /// Actual type name.
        actual: String,
    },

    /// Value is null when non-null was expected.
    #[error("unexpected null value")]
    UnexpectedNull,

    /// A custom converter failed.
    #[error("converter failed: {0}")]
    Converter(String),
}

impl ConversionError {
    /// Shorthand for a [`ConversionError::MalformedPayload`].
    pub fn malformed(oid: Oid, reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            oid,
            reason: reason.into(),
        }
    }
}
