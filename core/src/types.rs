//! Domain value objects and the wire shapes they project to.
//!
//! # Design
//! Two layers per concept: a plain value the caller assembles ([`Demand`],
//! [`Fee`], [`Seat`], [`Payment`]) with a `to_request()` projection, and a
//! `Serialize` struct pinning the vendor's exact field names. The mixed
//! PascalCase and lowercase casing on the wire is a compatibility contract,
//! not a style choice. Optional members use `skip_serializing_if` so an
//! absent relation is dropped from the payload entirely, never sent as
//! `null`.
//!
//! Response wrappers ([`Customer`], [`Basket`], [`Order`],
//! [`Authentication`]) type only the fields this library interprets;
//! everything else the vendor sent is retained in a flattened `extra` map
//! for callers to inspect.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SoftixError;

/// Sales channel stamped on every basket and offer body.
pub const CHANNEL_WEB: &str = "W";

/// Default means of payment for purchases settled outside the vendor.
pub const MEANS_OF_PAYMENT_EXTERNAL: &str = "EXTERNAL";

/// A request for `quantity` tickets of one price type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demand {
    pub price_type_code: String,
    pub quantity: u32,
    pub admits: u32,
}

impl Demand {
    pub fn new(price_type_code: impl Into<String>, quantity: u32, admits: u32) -> Self {
        Self {
            price_type_code: price_type_code.into(),
            quantity,
            admits,
        }
    }

    /// Project to the wire shape embedded in basket and offer bodies.
    pub fn to_request(&self) -> DemandRequest {
        DemandRequest {
            price_type_code: self.price_type_code.clone(),
            quantity: self.quantity,
            admits: self.admits,
            customer: CustomerRef::default(),
        }
    }
}

/// Wire shape of a [`Demand`]. The `Customer` member is always present and
/// always the empty object.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DemandRequest {
    #[serde(rename = "PriceTypeCode")]
    pub price_type_code: String,
    #[serde(rename = "Quantity")]
    pub quantity: u32,
    #[serde(rename = "Admits")]
    pub admits: u32,
    #[serde(rename = "Customer")]
    pub customer: CustomerRef,
}

/// An additional charge category attached to a basket or offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fee {
    pub fee_type: String,
    pub code: String,
}

impl Fee {
    pub fn new(fee_type: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            fee_type: fee_type.into(),
            code: code.into(),
        }
    }

    pub fn to_request(&self) -> FeeRequest {
        FeeRequest {
            fee_type: self.fee_type.clone(),
            code: self.code.clone(),
        }
    }
}

/// Wire shape of a [`Fee`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FeeRequest {
    #[serde(rename = "Type")]
    pub fee_type: String,
    #[serde(rename = "Code")]
    pub code: String,
}

/// An explicit seat assignment within a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub section: String,
    pub row: String,
    pub seats: Vec<String>,
}

impl Seat {
    pub fn new(section: impl Into<String>, row: impl Into<String>, seats: Vec<String>) -> Self {
        Self {
            section: section.into(),
            row: row.into(),
            seats,
        }
    }

    pub fn to_request(&self) -> SeatRequest {
        SeatRequest {
            section: self.section.clone(),
            row: self.row.clone(),
            seats: self.seats.clone(),
        }
    }
}

/// Wire shape of a [`Seat`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SeatRequest {
    #[serde(rename = "Section")]
    pub section: String,
    #[serde(rename = "Row")]
    pub row: String,
    #[serde(rename = "Seats")]
    pub seats: Vec<String>,
}

/// A payment instruction, usually derived from a basket's computed total.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub amount: f64,
    pub means_of_payment: String,
}

impl Payment {
    /// A payment settled outside the vendor, the default means.
    pub fn new(amount: f64) -> Self {
        Self {
            amount,
            means_of_payment: MEANS_OF_PAYMENT_EXTERNAL.to_string(),
        }
    }

    pub fn with_means(amount: f64, means_of_payment: impl Into<String>) -> Self {
        Self {
            amount,
            means_of_payment: means_of_payment.into(),
        }
    }

    pub fn to_request(&self) -> PaymentRequest {
        PaymentRequest {
            amount: self.amount,
            means_of_payment: self.means_of_payment.clone(),
        }
    }
}

/// Wire shape of a [`Payment`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentRequest {
    #[serde(rename = "Amount")]
    pub amount: f64,
    #[serde(rename = "MeansOfPayment")]
    pub means_of_payment: String,
}

/// A new-customer record assembled by the caller, field name to value.
///
/// The vendor takes lowercase field names here, unlike the PascalCase
/// resource bodies. Validation and normalization happen when the
/// registration request is built, not on insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CustomerProfile {
    fields: BTreeMap<String, String>,
}

impl CustomerProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.fields.remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// All fields in lexicographic order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CustomerProfile {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Reference to an existing vendor customer, embedded in request bodies.
///
/// Serializes as `{"ID", "Account", "AFile"}` with absent members omitted,
/// so an empty reference serializes as `{}` — exactly what the vendor
/// expects for the constant `Customer` member of a demand.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerRef {
    #[serde(rename = "ID", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "Account", skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(rename = "AFile", skip_serializing_if = "Option::is_none")]
    pub afile: Option<String>,
}

impl CustomerRef {
    /// Reference a customer by ID alone, account details unknown.
    pub fn from_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.account.is_none() && self.afile.is_none()
    }
}

/// A customer record returned by the vendor.
///
/// `ID`, `Account`, and `AFile` form the reference triple later requests
/// embed; every other field the vendor sent is retained in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Account", default)]
    pub account: String,
    #[serde(rename = "AFile", default)]
    pub afile: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Customer {
    /// Project to the reference triple embedded in basket and purchase bodies.
    pub fn to_request(&self) -> CustomerRef {
        CustomerRef {
            id: Some(self.id),
            account: Some(self.account.clone()),
            afile: Some(self.afile.clone()),
        }
    }
}

/// A live vendor credential derived from the token response.
///
/// Read-only once constructed. The token is never refreshed automatically;
/// callers watch [`expiration_date`](Self::expiration_date) or
/// [`is_expired`](Self::is_expired) and re-authenticate themselves.
#[derive(Clone)]
pub struct Authentication {
    access_token: String,
    expires_in: i64,
    expiration_date: DateTime<Utc>,
    raw: Value,
}

impl Authentication {
    /// Parse the vendor's token response.
    ///
    /// A response without `access_token` or `expires_in` is a fatal
    /// authentication failure, never silently tolerated.
    pub fn from_response(raw: Value) -> Result<Self, SoftixError> {
        let access_token = raw
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| SoftixError::Authentication("missing access_token from API".into()))?
            .to_string();
        let expires_in = raw
            .get("expires_in")
            .and_then(Value::as_i64)
            .ok_or_else(|| SoftixError::Authentication("missing expires_in from API".into()))?;
        let expiration_date = Utc::now() + Duration::seconds(expires_in);
        Ok(Self {
            access_token,
            expires_in,
            expiration_date,
            raw,
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Seconds of validity the vendor granted at issue time.
    pub fn expires_in(&self) -> i64 {
        self.expires_in
    }

    /// Issue time plus `expires_in` seconds.
    pub fn expiration_date(&self) -> DateTime<Utc> {
        self.expiration_date
    }

    /// Whether the expiration date has passed. The library never acts on
    /// this itself; re-authentication is the caller's move.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expiration_date
    }

    /// The vendor's token response as received.
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

// The token must not leak through debug logs, so the derive is off limits.
impl std::fmt::Debug for Authentication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authentication")
            .field("access_token", &"********")
            .field("expires_in", &self.expires_in)
            .field("expiration_date", &self.expiration_date)
            .finish_non_exhaustive()
    }
}

/// An in-progress order: offers plus fees awaiting purchase.
///
/// Only the offer price chain is typed; the rest of the vendor's basket
/// resource stays in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Basket {
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "Offers", default)]
    pub offers: Vec<Offer>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Basket {
    /// Sum of each offer's net price. An offer the vendor returned without
    /// demand or price entries contributes nothing.
    pub fn total(&self) -> f64 {
        self.offers.iter().filter_map(Offer::net).sum()
    }
}

/// One priced group of seats inside a basket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Offer {
    #[serde(rename = "Demand", default)]
    pub demand: Vec<OfferDemand>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Offer {
    /// Net price of this offer: the first demand's first price.
    pub fn net(&self) -> Option<f64> {
        self.demand.first()?.prices.first().map(|price| price.net)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfferDemand {
    #[serde(rename = "Prices", default)]
    pub prices: Vec<OfferPrice>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfferPrice {
    #[serde(rename = "Net")]
    pub net: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A purchased order resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "OrderItems", default)]
    pub order_items: Vec<OrderItem>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Order {
    /// Line items of the first order item. The vendor keys everything
    /// through `OrderItems[0]`.
    pub fn line_items(&self) -> &[OrderLineItem] {
        self.order_items
            .first()
            .map(|item| item.line_items.as_slice())
            .unwrap_or(&[])
    }

    /// Sum of line-item net prices.
    pub fn total(&self) -> f64 {
        self.line_items().iter().filter_map(OrderLineItem::net).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    #[serde(rename = "OrderLineItems", default)]
    pub line_items: Vec<OrderLineItem>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLineItem {
    #[serde(rename = "Price", default, skip_serializing_if = "Option::is_none")]
    pub price: Option<LineItemPrice>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl OrderLineItem {
    pub fn net(&self) -> Option<f64> {
        self.price.as_ref().map(|price| price.net)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItemPrice {
    #[serde(rename = "Net")]
    pub net: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Body of basket creation (`POST baskets`).
///
/// `Channel` is always `"W"` and `holdcode` always the empty string; the
/// vendor requires both unconditionally. `Seats` and `Customer` are omitted
/// from the payload entirely when absent.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BasketRequest {
    #[serde(rename = "Channel")]
    pub channel: String,
    #[serde(rename = "Seller")]
    pub seller: String,
    #[serde(rename = "Performancecode")]
    pub performance_code: String,
    #[serde(rename = "Area")]
    pub area: String,
    #[serde(rename = "holdcode")]
    pub hold_code: String,
    #[serde(rename = "Demand")]
    pub demand: Vec<DemandRequest>,
    #[serde(rename = "Fees")]
    pub fees: Vec<FeeRequest>,
    #[serde(rename = "Seats", skip_serializing_if = "Option::is_none")]
    pub seats: Option<SeatRequest>,
    #[serde(rename = "Customer", skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerRef>,
}

impl BasketRequest {
    pub fn new(
        seller: impl Into<String>,
        performance_code: impl Into<String>,
        area: impl Into<String>,
        demands: &[Demand],
        fees: &[Fee],
    ) -> Self {
        Self {
            channel: CHANNEL_WEB.to_string(),
            seller: seller.into(),
            performance_code: performance_code.into(),
            area: area.into(),
            hold_code: String::new(),
            demand: demands.iter().map(Demand::to_request).collect(),
            fees: fees.iter().map(Fee::to_request).collect(),
            seats: None,
            customer: None,
        }
    }

    #[must_use]
    pub fn with_seats(mut self, seat: &Seat) -> Self {
        self.seats = Some(seat.to_request());
        self
    }

    #[must_use]
    pub fn with_customer(mut self, customer: CustomerRef) -> Self {
        self.customer = Some(customer);
        self
    }
}

/// Body of offer addition (`POST baskets/{id}/offers`): the basket body
/// without a customer member.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OfferRequest {
    #[serde(rename = "Channel")]
    pub channel: String,
    #[serde(rename = "Seller")]
    pub seller: String,
    #[serde(rename = "Performancecode")]
    pub performance_code: String,
    #[serde(rename = "Area")]
    pub area: String,
    #[serde(rename = "holdcode")]
    pub hold_code: String,
    #[serde(rename = "Demand")]
    pub demand: Vec<DemandRequest>,
    #[serde(rename = "Fees")]
    pub fees: Vec<FeeRequest>,
    #[serde(rename = "Seats", skip_serializing_if = "Option::is_none")]
    pub seats: Option<SeatRequest>,
}

impl OfferRequest {
    pub fn new(
        seller: impl Into<String>,
        performance_code: impl Into<String>,
        area: impl Into<String>,
        demands: &[Demand],
        fees: &[Fee],
    ) -> Self {
        Self {
            channel: CHANNEL_WEB.to_string(),
            seller: seller.into(),
            performance_code: performance_code.into(),
            area: area.into(),
            hold_code: String::new(),
            demand: demands.iter().map(Demand::to_request).collect(),
            fees: fees.iter().map(Fee::to_request).collect(),
            seats: None,
        }
    }

    #[must_use]
    pub fn with_seats(mut self, seat: &Seat) -> Self {
        self.seats = Some(seat.to_request());
        self
    }
}

/// Body of basket purchase (`POST Baskets/{id}/purchase`).
///
/// The vendor takes the customer reference under lowercase `customer` here,
/// unlike basket creation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PurchaseRequest {
    #[serde(rename = "Seller")]
    pub seller: String,
    #[serde(rename = "Payments")]
    pub payments: Vec<PaymentRequest>,
    #[serde(rename = "customer", skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerRef>,
}

impl PurchaseRequest {
    pub fn new(seller: impl Into<String>, payments: &[Payment]) -> Self {
        Self {
            seller: seller.into(),
            payments: payments.iter().map(Payment::to_request).collect(),
            customer: None,
        }
    }

    #[must_use]
    pub fn with_customer(mut self, customer: CustomerRef) -> Self {
        self.customer = Some(customer);
        self
    }
}

/// Body of order reversal (`POST orders/{id}/reverse`).
///
/// `refunds` carries the raw order total, lowercase, per the vendor's
/// reversal contract.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReverseRequest {
    #[serde(rename = "Seller")]
    pub seller: String,
    #[serde(rename = "refunds")]
    pub refunds: f64,
}

impl ReverseRequest {
    pub fn new(seller: impl Into<String>, refunds: f64) -> Self {
        Self {
            seller: seller.into(),
            refunds,
        }
    }
}
