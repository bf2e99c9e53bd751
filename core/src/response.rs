//! Response classification, the single error-detection point.
//!
//! # Design
//! Every parse routine runs its response through [`classify_response`]
//! before touching the body. The outcome is a three-way enum rather than a
//! boolean: a vendor error (status >= 400) carries the vendor's `Message`,
//! and a status that is neither the documented success code nor an error is
//! its own explicit case instead of a silent `false`.

use serde_json::Value;

use crate::http::HttpResponse;

/// Outcome of matching a response against the status its endpoint documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// The documented success status for the endpoint.
    Success,
    /// The vendor reported an error (status >= 400). `message` is the JSON
    /// body's `Message` field, or the raw body when there is none.
    VendorError { status: u16, message: String },
    /// Neither the documented status nor an error, a redirect for example.
    /// Parse routines treat this as fatal.
    UnexpectedStatus { status: u16 },
}

/// Classify `response` against the success status documented for the
/// endpoint that produced it.
pub fn classify_response(response: &HttpResponse, expected_status: u16) -> ResponseOutcome {
    if response.status == expected_status {
        return ResponseOutcome::Success;
    }
    if response.status >= 400 {
        return ResponseOutcome::VendorError {
            status: response.status,
            message: vendor_message(&response.body),
        };
    }
    ResponseOutcome::UnexpectedStatus {
        status: response.status,
    }
}

/// Extract the vendor's `Message` from an error body, falling back to the
/// body itself when it is not JSON or carries no message.
fn vendor_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("Message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
