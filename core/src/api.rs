//! One-call vendor operations over a caller-supplied transport.
//!
//! # Design
//! [`SoftixApi`] composes the stateless [`SoftixClient`] with an
//! [`HttpTransport`] and exposes each vendor operation as a single blocking
//! call, including the compound flows: basket creation fetches the
//! referenced customer, and purchase fetches the basket to price its
//! payment. It owns no session state — `authenticate` hands the
//! [`Authentication`] to the caller and every authorized operation borrows
//! it back, so one instance serves one logical session and callers decide
//! when to re-authenticate.
//!
//! Each round-trip passes through a single dispatch point that emits
//! `tracing` debug events for the operation name, method, URL, and response
//! status. Tokens and headers are never logged.

use chrono::NaiveDate;
use serde_json::Value;

use crate::client::SoftixClient;
use crate::error::SoftixError;
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::types::{
    Authentication, Basket, Customer, CustomerProfile, CustomerRef, Demand, Fee, Order, Payment,
    Seat,
};

/// Blocking facade over the Softix API.
pub struct SoftixApi<T> {
    client: SoftixClient,
    transport: T,
}

impl<T: HttpTransport> SoftixApi<T> {
    pub fn new(base_url: &str, transport: T) -> Self {
        Self {
            client: SoftixClient::new(base_url),
            transport,
        }
    }

    /// The underlying request builder, for callers that want to execute a
    /// round-trip themselves.
    pub fn client(&self) -> &SoftixClient {
        &self.client
    }

    /// Exchange seller credentials for a bearer credential.
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Authentication, SoftixError> {
        let request = self.client.build_authenticate(username, password);
        let response = self.dispatch("authenticate", request)?;
        self.client.parse_authenticate(response)
    }

    /// Validate, normalize, and register a new customer.
    pub fn create_customer(
        &self,
        auth: &Authentication,
        seller_code: &str,
        profile: &CustomerProfile,
    ) -> Result<Customer, SoftixError> {
        let request = self
            .client
            .build_create_customer(auth, seller_code, profile)?;
        let response = self.dispatch("create_customer", request)?;
        self.client.parse_create_customer(response)
    }

    pub fn customer(
        &self,
        auth: &Authentication,
        seller_code: &str,
        customer_id: i64,
    ) -> Result<Customer, SoftixError> {
        let request = self.client.build_customer(auth, seller_code, customer_id);
        let response = self.dispatch("customer", request)?;
        self.client.parse_customer(response)
    }

    /// Create a basket. When `customer_id` is given the customer is fetched
    /// first and its reference triple embedded in the body.
    #[allow(clippy::too_many_arguments)]
    pub fn create_basket(
        &self,
        auth: &Authentication,
        seller_code: &str,
        performance_code: &str,
        section: &str,
        demands: &[Demand],
        fees: &[Fee],
        customer_id: Option<i64>,
    ) -> Result<Basket, SoftixError> {
        let customer = self.customer_ref(auth, seller_code, customer_id)?;
        let request = self.client.build_create_basket(
            auth,
            seller_code,
            performance_code,
            section,
            demands,
            fees,
            None,
            customer,
        )?;
        let response = self.dispatch("create_basket", request)?;
        self.client.parse_create_basket(response)
    }

    /// Create a basket with an explicit seat assignment.
    #[allow(clippy::too_many_arguments)]
    pub fn create_basket_with_seat(
        &self,
        auth: &Authentication,
        seller_code: &str,
        performance_code: &str,
        section: &str,
        demands: &[Demand],
        fees: &[Fee],
        seat: &Seat,
        customer_id: Option<i64>,
    ) -> Result<Basket, SoftixError> {
        let customer = self.customer_ref(auth, seller_code, customer_id)?;
        let request = self.client.build_create_basket(
            auth,
            seller_code,
            performance_code,
            section,
            demands,
            fees,
            Some(seat),
            customer,
        )?;
        let response = self.dispatch("create_basket_with_seat", request)?;
        self.client.parse_create_basket(response)
    }

    /// Add an offer to an existing basket.
    #[allow(clippy::too_many_arguments)]
    pub fn add_offer(
        &self,
        auth: &Authentication,
        seller_code: &str,
        basket_id: &str,
        performance_code: &str,
        section: &str,
        demands: &[Demand],
        fees: &[Fee],
    ) -> Result<Value, SoftixError> {
        let request = self.client.build_add_offer(
            auth,
            seller_code,
            basket_id,
            performance_code,
            section,
            demands,
            fees,
            None,
        )?;
        let response = self.dispatch("add_offer", request)?;
        self.client.parse_add_offer(response)
    }

    /// Add an offer with an explicit seat assignment.
    #[allow(clippy::too_many_arguments)]
    pub fn add_offer_with_seats(
        &self,
        auth: &Authentication,
        seller_code: &str,
        basket_id: &str,
        performance_code: &str,
        section: &str,
        demands: &[Demand],
        fees: &[Fee],
        seat: &Seat,
    ) -> Result<Value, SoftixError> {
        let request = self.client.build_add_offer(
            auth,
            seller_code,
            basket_id,
            performance_code,
            section,
            demands,
            fees,
            Some(seat),
        )?;
        let response = self.dispatch("add_offer_with_seats", request)?;
        self.client.parse_add_offer(response)
    }

    pub fn basket(
        &self,
        auth: &Authentication,
        seller_code: &str,
        basket_id: &str,
    ) -> Result<Basket, SoftixError> {
        let request = self.client.build_basket(auth, seller_code, basket_id);
        let response = self.dispatch("basket", request)?;
        self.client.parse_basket(response)
    }

    /// Purchase a basket for its full current total.
    ///
    /// Fetches the basket to price the payment from the vendor's current
    /// view, then posts a single external payment for that amount. When
    /// `customer_id` is given the customer is fetched and attached too.
    pub fn purchase_basket(
        &self,
        auth: &Authentication,
        seller_code: &str,
        basket_id: &str,
        customer_id: Option<i64>,
    ) -> Result<Value, SoftixError> {
        let basket = self.basket(auth, seller_code, basket_id)?;
        let payments = [Payment::new(basket.total())];
        let customer = self.customer_ref(auth, seller_code, customer_id)?;
        let request = self.client.build_purchase_basket(
            auth,
            seller_code,
            basket_id,
            &payments,
            customer,
        )?;
        let response = self.dispatch("purchase_basket", request)?;
        self.client.parse_purchase_basket(response)
    }

    pub fn order(
        &self,
        auth: &Authentication,
        seller_code: &str,
        order_id: &str,
    ) -> Result<Order, SoftixError> {
        let request = self.client.build_order(auth, seller_code, order_id);
        let response = self.dispatch("order", request)?;
        self.client.parse_order(response)
    }

    /// Reverse an order, refunding `total` in full.
    pub fn reverse_order(
        &self,
        auth: &Authentication,
        seller_code: &str,
        order_id: &str,
        total: f64,
    ) -> Result<(), SoftixError> {
        let request = self
            .client
            .build_reverse_order(auth, seller_code, order_id, total)?;
        let response = self.dispatch("reverse_order", request)?;
        self.client.parse_reverse_order(response)
    }

    /// Transactions settled between `from_date` and `to_date`, inclusive.
    pub fn transaction_sync(
        &self,
        auth: &Authentication,
        seller_code: &str,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Value, SoftixError> {
        let request = self
            .client
            .build_transaction_sync(auth, seller_code, from_date, to_date);
        let response = self.dispatch("transaction_sync", request)?;
        self.client.parse_transaction_sync(response)
    }

    pub fn performance_availabilities(
        &self,
        auth: &Authentication,
        seller_code: &str,
        performance_code: &str,
    ) -> Result<Value, SoftixError> {
        let request =
            self.client
                .build_performance_availabilities(auth, seller_code, performance_code);
        let response = self.dispatch("performance_availabilities", request)?;
        self.client.parse_performance_availabilities(response)
    }

    pub fn performance_prices(
        &self,
        auth: &Authentication,
        seller_code: &str,
        performance_code: &str,
    ) -> Result<Value, SoftixError> {
        let request = self
            .client
            .build_performance_prices(auth, seller_code, performance_code);
        let response = self.dispatch("performance_prices", request)?;
        self.client.parse_performance_prices(response)
    }

    /// Resolve an optional customer id to its reference triple.
    fn customer_ref(
        &self,
        auth: &Authentication,
        seller_code: &str,
        customer_id: Option<i64>,
    ) -> Result<Option<CustomerRef>, SoftixError> {
        customer_id
            .map(|id| {
                self.customer(auth, seller_code, id)
                    .map(|customer| customer.to_request())
            })
            .transpose()
    }

    fn dispatch(
        &self,
        operation: &'static str,
        request: HttpRequest,
    ) -> Result<HttpResponse, SoftixError> {
        tracing::debug!(operation, method = ?request.method, url = %request.url, "dispatching vendor request");
        let response = self.transport.execute(request)?;
        tracing::debug!(operation, status = response.status, "vendor responded");
        Ok(response)
    }
}
