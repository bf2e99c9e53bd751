//! Error types for the Softix API client.
//!
//! # Design
//! Validation failures (`MissingRequiredCustomerField`, `InvalidCustomerField`)
//! are raised while the request is being built, so a bad customer record never
//! costs a network round-trip. `Vendor` carries the vendor's own `Message` for
//! any status >= 400, and `UnexpectedStatus` is its own variant: a status that
//! is neither the documented success code nor an error is reported, never
//! silently swallowed.

use thiserror::Error;

use crate::http::TransportError;

/// Errors returned by `SoftixClient` and `SoftixApi` operations.
#[derive(Debug, Error)]
pub enum SoftixError {
    /// A required field was absent from a customer record. Fields are
    /// checked in a fixed order and the first missing one is reported.
    #[error("missing required customer field \"{field}\"")]
    MissingRequiredCustomerField { field: &'static str },

    /// A customer field was present but violates its shape constraint.
    #[error("customer field \"{field}\" must be exactly 2 characters")]
    InvalidCustomerField { field: &'static str },

    /// The vendor's token response could not be turned into a credential.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The vendor answered with an error status (>= 400); `message` is the
    /// vendor's own `Message` field when the body carries one.
    #[error("vendor error (status {status}): {message}")]
    Vendor { status: u16, message: String },

    /// The vendor answered with a status that is neither the documented
    /// success code for the endpoint nor an error.
    #[error("unexpected status {status} (expected {expected})")]
    UnexpectedStatus { status: u16, expected: u16 },

    /// The transport produced no response at all.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}
