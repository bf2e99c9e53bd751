//! Synchronous client for the Softix ticketing API.
//!
//! # Overview
//! Covers the seller-facing vendor surface: token authentication, customer
//! validation and registration, basket and offer construction, purchase,
//! reversal, and the reporting reads. [`SoftixClient`] builds `HttpRequest`
//! values and parses `HttpResponse` values without touching the network
//! (host-does-IO pattern); [`SoftixApi`] layers one-call operations,
//! including the compound purchase flow, over a caller-supplied blocking
//! [`HttpTransport`].
//!
//! # Design
//! - No session state: `authenticate` returns a caller-owned
//!   [`Authentication`] and every authorized call borrows it. Callers watch
//!   its expiry and re-authenticate when they choose.
//! - Wire shapes are typed `serde` structs pinning the vendor's exact field
//!   casing; absent optional members are omitted, never sent as `null`.
//! - Customer records are validated and normalized before a request is
//!   built, so bad input never costs a round-trip.
//! - Every response passes through the [`response`] classifier: one
//!   documented success status per endpoint, vendor errors carry the
//!   vendor's own message, and anything else is an explicit error.

pub mod api;
pub mod client;
pub mod error;
pub mod http;
pub mod response;
pub mod types;
pub mod validation;

pub use api::SoftixApi;
pub use client::SoftixClient;
pub use error::SoftixError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};
pub use response::{classify_response, ResponseOutcome};
pub use types::{
    Authentication, Basket, Customer, CustomerProfile, CustomerRef, Demand, Fee, Offer, Order,
    Payment, Seat,
};
pub use validation::{uppercase_fields, validate_customer, REQUIRED_CUSTOMER_FIELDS};
