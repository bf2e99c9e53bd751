//! Stateless HTTP request builder and response parser for the Softix API.
//!
//! # Design
//! `SoftixClient` holds only a `base_url` and carries no mutable state
//! between calls, in particular no access token. Each vendor operation is
//! split into a `build_*` method that produces an `HttpRequest` and a
//! `parse_*` method that consumes an `HttpResponse`; authorized builders
//! borrow the caller-owned [`Authentication`] they sign with. The caller
//! (or [`SoftixApi`](crate::SoftixApi)) executes the HTTP round-trip in
//! between, keeping the core deterministic and free of I/O dependencies.
//!
//! Every parse routine classifies the response status first. Each endpoint
//! documents exactly one success status and anything else becomes an error,
//! including statuses that merely look successful.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::error::SoftixError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::response::{classify_response, ResponseOutcome};
use crate::types::{
    Authentication, Basket, BasketRequest, Customer, CustomerProfile, CustomerRef, Demand, Fee,
    OfferRequest, Order, Payment, PurchaseRequest, ReverseRequest, Seat, CHANNEL_WEB,
};
use crate::validation::{uppercase_fields, validate_customer};

/// Media type the vendor versions its API under, sent on every request.
pub const ACCEPT: &str = "application/vnd.softix.api-v1.0+json";

/// Language every response is requested in.
pub const ACCEPT_LANGUAGE: &str = "en_US";

/// Synchronous, stateless client for the Softix API.
///
/// Produces `HttpRequest` values and consumes `HttpResponse` values; the
/// network round-trip between a `build_*` and its `parse_*` is the caller's
/// job (or [`SoftixApi`](crate::SoftixApi)'s).
#[derive(Debug, Clone)]
pub struct SoftixClient {
    base_url: String,
}

impl SoftixClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    // --- Authentication ---

    /// Token request: HTTP basic credentials and a form body, no bearer.
    pub fn build_authenticate(&self, username: &str, password: &str) -> HttpRequest {
        let credentials = BASE64.encode(format!("{username}:{password}"));
        let mut headers = vendor_headers();
        headers.push(("Authorization".to_string(), format!("Basic {credentials}")));
        headers.push((
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        ));
        HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}/oauth2/accesstoken", self.base_url),
            headers,
            body: Some("grant_type=client_credentials".to_string()),
        }
    }

    pub fn parse_authenticate(&self, response: HttpResponse) -> Result<Authentication, SoftixError> {
        expect_status(&response, 200)?;
        let raw: Value = serde_json::from_str(&response.body)
            .map_err(|e| SoftixError::Deserialization(e.to_string()))?;
        Authentication::from_response(raw)
    }

    // --- Customers ---

    /// Validate and normalize `profile`, then build the registration request.
    ///
    /// Validation failures surface here, before anything reaches the wire;
    /// `nationality` and `countrycode` are uppercased in the payload.
    pub fn build_create_customer(
        &self,
        auth: &Authentication,
        seller_code: &str,
        profile: &CustomerProfile,
    ) -> Result<HttpRequest, SoftixError> {
        validate_customer(profile)?;
        let normalized = uppercase_fields(profile, &["nationality", "countrycode"]);
        self.post_json(
            auth,
            format!("{}/customers?sellerCode={seller_code}", self.base_url),
            &normalized,
        )
    }

    /// The vendor answers customer creation with 200, not 201.
    pub fn parse_create_customer(&self, response: HttpResponse) -> Result<Customer, SoftixError> {
        expect_status(&response, 200)?;
        decode(&response)
    }

    pub fn build_customer(
        &self,
        auth: &Authentication,
        seller_code: &str,
        customer_id: i64,
    ) -> HttpRequest {
        self.get(
            auth,
            format!(
                "{}/customers/{customer_id}?sellerCode={seller_code}",
                self.base_url
            ),
        )
    }

    pub fn parse_customer(&self, response: HttpResponse) -> Result<Customer, SoftixError> {
        expect_status(&response, 200)?;
        decode(&response)
    }

    // --- Baskets and offers ---

    /// Basket creation. `seat` pins explicit seats and `customer` attaches
    /// an existing customer's reference; both are omitted from the payload
    /// entirely when absent.
    #[allow(clippy::too_many_arguments)]
    pub fn build_create_basket(
        &self,
        auth: &Authentication,
        seller_code: &str,
        performance_code: &str,
        section: &str,
        demands: &[Demand],
        fees: &[Fee],
        seat: Option<&Seat>,
        customer: Option<CustomerRef>,
    ) -> Result<HttpRequest, SoftixError> {
        let mut body = BasketRequest::new(seller_code, performance_code, section, demands, fees);
        if let Some(seat) = seat {
            body = body.with_seats(seat);
        }
        if let Some(customer) = customer {
            body = body.with_customer(customer);
        }
        self.post_json(auth, format!("{}/baskets", self.base_url), &body)
    }

    pub fn parse_create_basket(&self, response: HttpResponse) -> Result<Basket, SoftixError> {
        expect_status(&response, 201)?;
        decode(&response)
    }

    /// Offer addition: the basket body without a customer member.
    #[allow(clippy::too_many_arguments)]
    pub fn build_add_offer(
        &self,
        auth: &Authentication,
        seller_code: &str,
        basket_id: &str,
        performance_code: &str,
        section: &str,
        demands: &[Demand],
        fees: &[Fee],
        seat: Option<&Seat>,
    ) -> Result<HttpRequest, SoftixError> {
        let mut body = OfferRequest::new(seller_code, performance_code, section, demands, fees);
        if let Some(seat) = seat {
            body = body.with_seats(seat);
        }
        self.post_json(
            auth,
            format!("{}/baskets/{basket_id}/offers", self.base_url),
            &body,
        )
    }

    pub fn parse_add_offer(&self, response: HttpResponse) -> Result<Value, SoftixError> {
        expect_status(&response, 201)?;
        decode(&response)
    }

    pub fn build_basket(
        &self,
        auth: &Authentication,
        seller_code: &str,
        basket_id: &str,
    ) -> HttpRequest {
        self.get(
            auth,
            format!(
                "{}/baskets/{basket_id}?sellerCode={seller_code}",
                self.base_url
            ),
        )
    }

    pub fn parse_basket(&self, response: HttpResponse) -> Result<Basket, SoftixError> {
        expect_status(&response, 200)?;
        decode(&response)
    }

    // --- Purchase and reversal ---

    /// Purchase request for a basket whose total is already known. Callers
    /// fetch the basket to price the payment, or let
    /// [`SoftixApi::purchase_basket`](crate::SoftixApi::purchase_basket) do
    /// both. The purchase path is cased `Baskets`, unlike basket reads.
    pub fn build_purchase_basket(
        &self,
        auth: &Authentication,
        seller_code: &str,
        basket_id: &str,
        payments: &[Payment],
        customer: Option<CustomerRef>,
    ) -> Result<HttpRequest, SoftixError> {
        let mut body = PurchaseRequest::new(seller_code, payments);
        if let Some(customer) = customer {
            body = body.with_customer(customer);
        }
        self.post_json(
            auth,
            format!("{}/Baskets/{basket_id}/purchase", self.base_url),
            &body,
        )
    }

    pub fn parse_purchase_basket(&self, response: HttpResponse) -> Result<Value, SoftixError> {
        expect_status(&response, 201)?;
        decode(&response)
    }

    pub fn build_order(
        &self,
        auth: &Authentication,
        seller_code: &str,
        order_id: &str,
    ) -> HttpRequest {
        self.get(
            auth,
            format!(
                "{}/orders/{order_id}?sellerCode={seller_code}",
                self.base_url
            ),
        )
    }

    pub fn parse_order(&self, response: HttpResponse) -> Result<Order, SoftixError> {
        expect_status(&response, 200)?;
        decode(&response)
    }

    /// Reversal refunds the full order total; there is no partial refund.
    pub fn build_reverse_order(
        &self,
        auth: &Authentication,
        seller_code: &str,
        order_id: &str,
        total: f64,
    ) -> Result<HttpRequest, SoftixError> {
        self.post_json(
            auth,
            format!("{}/orders/{order_id}/reverse", self.base_url),
            &ReverseRequest::new(seller_code, total),
        )
    }

    /// Success is 204 with no body.
    pub fn parse_reverse_order(&self, response: HttpResponse) -> Result<(), SoftixError> {
        expect_status(&response, 204)
    }

    // --- Reporting and performances ---

    /// Transactions settled between `from_date` and `to_date`, inclusive.
    pub fn build_transaction_sync(
        &self,
        auth: &Authentication,
        seller_code: &str,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> HttpRequest {
        self.get(
            auth,
            format!(
                "{}/dcal/transync/{}/{}?sellerCode={seller_code}",
                self.base_url,
                from_date.format("%Y-%m-%d"),
                to_date.format("%Y-%m-%d"),
            ),
        )
    }

    pub fn parse_transaction_sync(&self, response: HttpResponse) -> Result<Value, SoftixError> {
        expect_status(&response, 200)?;
        decode(&response)
    }

    pub fn build_performance_availabilities(
        &self,
        auth: &Authentication,
        seller_code: &str,
        performance_code: &str,
    ) -> HttpRequest {
        self.get(
            auth,
            format!(
                "{}/performances/{performance_code}/availabilities?channel={CHANNEL_WEB}&sellerCode={seller_code}",
                self.base_url
            ),
        )
    }

    pub fn parse_performance_availabilities(
        &self,
        response: HttpResponse,
    ) -> Result<Value, SoftixError> {
        expect_status(&response, 200)?;
        decode(&response)
    }

    pub fn build_performance_prices(
        &self,
        auth: &Authentication,
        seller_code: &str,
        performance_code: &str,
    ) -> HttpRequest {
        self.get(
            auth,
            format!(
                "{}/performances/{performance_code}/prices?channel={CHANNEL_WEB}&sellerCode={seller_code}",
                self.base_url
            ),
        )
    }

    pub fn parse_performance_prices(&self, response: HttpResponse) -> Result<Value, SoftixError> {
        expect_status(&response, 200)?;
        decode(&response)
    }

    // --- Request plumbing ---

    fn get(&self, auth: &Authentication, url: String) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: authorized_headers(auth),
            body: None,
        }
    }

    fn post_json<T: Serialize>(
        &self,
        auth: &Authentication,
        url: String,
        body: &T,
    ) -> Result<HttpRequest, SoftixError> {
        let body =
            serde_json::to_string(body).map_err(|e| SoftixError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url,
            headers: authorized_headers(auth),
            body: Some(body),
        })
    }
}

/// Headers the vendor expects on every request.
fn vendor_headers() -> Vec<(String, String)> {
    vec![
        ("Accept".to_string(), ACCEPT.to_string()),
        ("Accept-Language".to_string(), ACCEPT_LANGUAGE.to_string()),
    ]
}

fn authorized_headers(auth: &Authentication) -> Vec<(String, String)> {
    let mut headers = vendor_headers();
    headers.push((
        "Authorization".to_string(),
        format!("Bearer {}", auth.access_token()),
    ));
    headers.push(("Content-Type".to_string(), "application/json".to_string()));
    headers
}

fn decode<T: serde::de::DeserializeOwned>(response: &HttpResponse) -> Result<T, SoftixError> {
    serde_json::from_str(&response.body).map_err(|e| SoftixError::Deserialization(e.to_string()))
}

/// Map the classifier's outcome onto the error taxonomy.
fn expect_status(response: &HttpResponse, expected: u16) -> Result<(), SoftixError> {
    match classify_response(response, expected) {
        ResponseOutcome::Success => Ok(()),
        ResponseOutcome::VendorError { status, message } => {
            Err(SoftixError::Vendor { status, message })
        }
        ResponseOutcome::UnexpectedStatus { status } => {
            Err(SoftixError::UnexpectedStatus { status, expected })
        }
    }
}
