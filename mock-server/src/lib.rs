//! In-memory stand-in for the Softix vendor API.
//!
//! Implements the endpoints the client exercises, with the vendor's quirks
//! kept intact: mixed-case paths and field names, token issuance over HTTP
//! basic credentials, `{"Message": ...}` error bodies, and payment totals
//! checked against the basket's priced offers. State lives behind an
//! `Arc<RwLock>` and every [`app`] gets a fresh copy, so tests stay
//! isolated.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Unit net price per price type code.
const PRICE_TABLE: [(&str, f64); 3] = [("Q", 100.0), ("P", 50.0), ("B", 25.0)];

/// Price used for codes outside the table.
const FALLBACK_PRICE: f64 = 75.0;

/// Tolerance when comparing payment and refund amounts.
const AMOUNT_EPSILON: f64 = 0.005;

#[derive(Default)]
pub struct VendorState {
    pub tokens: Vec<String>,
    pub customers: HashMap<i64, Value>,
    pub next_customer_id: i64,
    pub baskets: HashMap<String, Value>,
    pub orders: HashMap<String, Value>,
}

pub type Db = Arc<RwLock<VendorState>>;

type VendorError = (StatusCode, Json<Value>);
type VendorResult = Result<(StatusCode, Json<Value>), VendorError>;

pub fn app() -> Router {
    let db = Db::default();
    Router::new()
        .route("/oauth2/accesstoken", post(access_token))
        .route("/customers", post(create_customer))
        .route("/customers/{id}", get(get_customer))
        .route("/baskets", post(create_basket))
        .route("/baskets/{id}", get(get_basket))
        .route("/baskets/{id}/offers", post(add_offer))
        .route("/Baskets/{id}/purchase", post(purchase_basket))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/reverse", post(reverse_order))
        .route(
            "/performances/{code}/availabilities",
            get(performance_availabilities),
        )
        .route("/performances/{code}/prices", get(performance_prices))
        .route("/dcal/transync/{from}/{to}", get(transaction_sync))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn vendor_error(status: StatusCode, message: &str) -> VendorError {
    (status, Json(json!({ "Message": message })))
}

async fn require_bearer(db: &Db, headers: &HeaderMap) -> Result<(), VendorError> {
    let token = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    match token {
        Some(token) if db.read().await.tokens.iter().any(|issued| issued == token) => Ok(()),
        _ => Err(vendor_error(
            StatusCode::UNAUTHORIZED,
            "A valid bearer token is required",
        )),
    }
}

fn require_seller_code(params: &HashMap<String, String>) -> Result<String, VendorError> {
    params
        .get("sellerCode")
        .filter(|code| !code.is_empty())
        .cloned()
        .ok_or_else(|| vendor_error(StatusCode::BAD_REQUEST, "sellerCode is required"))
}

async fn access_token(State(db): State<Db>, headers: HeaderMap, body: String) -> VendorResult {
    let has_basic = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.len() > "Basic ".len() && value.starts_with("Basic "));
    if !has_basic {
        return Err(vendor_error(
            StatusCode::UNAUTHORIZED,
            "Client credentials are required",
        ));
    }
    if body.trim() != "grant_type=client_credentials" {
        return Err(vendor_error(
            StatusCode::BAD_REQUEST,
            "Unsupported grant type",
        ));
    }
    let token = Uuid::new_v4().to_string();
    db.write().await.tokens.push(token.clone());
    Ok((
        StatusCode::OK,
        Json(json!({
            "access_token": token,
            "token_type": "bearer",
            "expires_in": 3600,
        })),
    ))
}

async fn create_customer(
    State(db): State<Db>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(profile): Json<Value>,
) -> VendorResult {
    require_bearer(&db, &headers).await?;
    let seller = require_seller_code(&params)?;
    let Some(fields) = profile.as_object() else {
        return Err(vendor_error(
            StatusCode::BAD_REQUEST,
            "A customer record is required",
        ));
    };
    let firstname = fields
        .get("firstname")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if firstname.is_empty() {
        return Err(vendor_error(
            StatusCode::BAD_REQUEST,
            "firstname is required",
        ));
    }

    let mut state = db.write().await;
    state.next_customer_id += 1;
    let id = state.next_customer_id;
    let mut record = fields.clone();
    record.insert("ID".to_string(), json!(id));
    record.insert("Account".to_string(), json!(format!("A{id:05}")));
    record.insert("AFile".to_string(), json!(format!("{seller}-{id:05}")));
    let record = Value::Object(record);
    state.customers.insert(id, record.clone());
    // The real vendor answers customer creation with 200, not 201.
    Ok((StatusCode::OK, Json(record)))
}

async fn get_customer(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> VendorResult {
    require_bearer(&db, &headers).await?;
    require_seller_code(&params)?;
    db.read()
        .await
        .customers
        .get(&id)
        .cloned()
        .map(|record| (StatusCode::OK, Json(record)))
        .ok_or_else(|| {
            vendor_error(
                StatusCode::NOT_FOUND,
                "No customer found for the requested customer id",
            )
        })
}

async fn create_basket(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> VendorResult {
    require_bearer(&db, &headers).await?;
    let seller = require_body_seller(&body)?;
    if body.get("Channel").and_then(Value::as_str) != Some("W") {
        return Err(vendor_error(StatusCode::BAD_REQUEST, "Channel must be W"));
    }
    let offer = price_offer(&body)?;
    let id = format!("bkt-{}", Uuid::new_v4());
    let basket = json!({
        "ID": id,
        "Seller": seller,
        "Offers": [offer],
    });
    db.write().await.baskets.insert(id.clone(), basket.clone());
    Ok((StatusCode::CREATED, Json(basket)))
}

async fn get_basket(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> VendorResult {
    require_bearer(&db, &headers).await?;
    require_seller_code(&params)?;
    db.read()
        .await
        .baskets
        .get(&id)
        .cloned()
        .map(|basket| (StatusCode::OK, Json(basket)))
        .ok_or_else(|| {
            vendor_error(
                StatusCode::NOT_FOUND,
                "No basket found for the requested basket id",
            )
        })
}

async fn add_offer(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> VendorResult {
    require_bearer(&db, &headers).await?;
    if body.get("Channel").and_then(Value::as_str) != Some("W") {
        return Err(vendor_error(StatusCode::BAD_REQUEST, "Channel must be W"));
    }
    let offer = price_offer(&body)?;
    let mut state = db.write().await;
    let Some(basket) = state.baskets.get_mut(&id) else {
        return Err(vendor_error(
            StatusCode::NOT_FOUND,
            "No basket found for the requested basket id",
        ));
    };
    if let Some(offers) = basket.get_mut("Offers").and_then(Value::as_array_mut) {
        offers.push(offer);
    }
    Ok((StatusCode::CREATED, Json(basket.clone())))
}

async fn purchase_basket(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> VendorResult {
    require_bearer(&db, &headers).await?;
    let seller = require_body_seller(&body)?;
    let mut state = db.write().await;
    let Some(basket) = state.baskets.get(&id).cloned() else {
        return Err(vendor_error(
            StatusCode::NOT_FOUND,
            "No basket found for the requested basket id",
        ));
    };
    let expected = basket_total(&basket);
    let paid = body
        .get("Payments")
        .and_then(Value::as_array)
        .map(|payments| {
            payments
                .iter()
                .filter_map(|payment| payment.get("Amount").and_then(Value::as_f64))
                .sum::<f64>()
        })
        .unwrap_or(0.0);
    if (paid - expected).abs() > AMOUNT_EPSILON {
        return Err(vendor_error(
            StatusCode::BAD_REQUEST,
            "Payment amount does not match the basket total",
        ));
    }

    let order_id = format!("ord-{}", Uuid::new_v4());
    let line_items: Vec<Value> = basket
        .get("Offers")
        .and_then(Value::as_array)
        .map(|offers| {
            offers
                .iter()
                .filter_map(offer_net)
                .map(|net| json!({ "Price": { "Net": net } }))
                .collect()
        })
        .unwrap_or_default();
    let mut order = serde_json::Map::new();
    order.insert("ID".to_string(), json!(order_id));
    order.insert("Seller".to_string(), json!(seller));
    order.insert(
        "OrderItems".to_string(),
        json!([{ "OrderLineItems": line_items }]),
    );
    if let Some(customer) = body.get("customer") {
        order.insert("Customer".to_string(), customer.clone());
    }
    let order = Value::Object(order);

    state.baskets.remove(&id);
    state.orders.insert(order_id, order.clone());
    Ok((StatusCode::CREATED, Json(order)))
}

async fn get_order(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> VendorResult {
    require_bearer(&db, &headers).await?;
    require_seller_code(&params)?;
    db.read()
        .await
        .orders
        .get(&id)
        .cloned()
        .map(|order| (StatusCode::OK, Json(order)))
        .ok_or_else(|| {
            vendor_error(
                StatusCode::NOT_FOUND,
                "No order found for the requested order id",
            )
        })
}

async fn reverse_order(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<StatusCode, VendorError> {
    require_bearer(&db, &headers).await?;
    require_body_seller(&body)?;
    let mut state = db.write().await;
    let Some(order) = state.orders.get(&id) else {
        return Err(vendor_error(
            StatusCode::NOT_FOUND,
            "No order found for the requested order id",
        ));
    };
    let refund = body.get("refunds").and_then(Value::as_f64).unwrap_or(0.0);
    if (refund - order_total(order)).abs() > AMOUNT_EPSILON {
        return Err(vendor_error(
            StatusCode::BAD_REQUEST,
            "Refund amount does not match the order total",
        ));
    }
    state.orders.remove(&id);
    Ok(StatusCode::NO_CONTENT)
}

async fn performance_availabilities(
    State(db): State<Db>,
    Path(code): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> VendorResult {
    require_bearer(&db, &headers).await?;
    require_seller_code(&params)?;
    let availabilities: Vec<Value> = PRICE_TABLE
        .iter()
        .map(|(price_type, _)| json!({ "PriceTypeCode": price_type, "Available": 120 }))
        .collect();
    Ok((
        StatusCode::OK,
        Json(json!({
            "PerformanceCode": code,
            "Availabilities": availabilities,
        })),
    ))
}

async fn performance_prices(
    State(db): State<Db>,
    Path(code): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> VendorResult {
    require_bearer(&db, &headers).await?;
    require_seller_code(&params)?;
    let prices: Vec<Value> = PRICE_TABLE
        .iter()
        .map(|(price_type, net)| json!({ "PriceTypeCode": price_type, "Net": net }))
        .collect();
    Ok((
        StatusCode::OK,
        Json(json!({
            "PerformanceCode": code,
            "Prices": prices,
        })),
    ))
}

async fn transaction_sync(
    State(db): State<Db>,
    Path((from, to)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> VendorResult {
    require_bearer(&db, &headers).await?;
    require_seller_code(&params)?;
    let orders: Vec<Value> = db.read().await.orders.values().cloned().collect();
    Ok((
        StatusCode::OK,
        Json(json!({
            "From": from,
            "To": to,
            "Transactions": orders,
        })),
    ))
}

fn require_body_seller(body: &Value) -> Result<String, VendorError> {
    body.get("Seller")
        .and_then(Value::as_str)
        .filter(|seller| !seller.is_empty())
        .map(str::to_string)
        .ok_or_else(|| vendor_error(StatusCode::BAD_REQUEST, "Seller is required"))
}

fn unit_price(price_type_code: &str) -> f64 {
    PRICE_TABLE
        .iter()
        .find(|(code, _)| *code == price_type_code)
        .map(|(_, net)| *net)
        .unwrap_or(FALLBACK_PRICE)
}

/// Price the demand of an incoming basket or offer body into an offer the
/// way the vendor would return it.
fn price_offer(body: &Value) -> Result<Value, VendorError> {
    let demands = body
        .get("Demand")
        .and_then(Value::as_array)
        .filter(|demands| !demands.is_empty())
        .ok_or_else(|| vendor_error(StatusCode::BAD_REQUEST, "Demand is required"))?;
    let priced: Vec<Value> = demands
        .iter()
        .map(|demand| {
            let code = demand
                .get("PriceTypeCode")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let quantity = demand.get("Quantity").and_then(Value::as_u64).unwrap_or(0);
            json!({
                "PriceTypeCode": code,
                "Quantity": quantity,
                "Admits": demand.get("Admits").and_then(Value::as_u64).unwrap_or(0),
                "Prices": [ { "Net": unit_price(code) * quantity as f64 } ],
            })
        })
        .collect();
    Ok(json!({
        "Performancecode": body.get("Performancecode").cloned().unwrap_or(Value::Null),
        "Area": body.get("Area").cloned().unwrap_or(Value::Null),
        "Demand": priced,
        "Fees": body.get("Fees").cloned().unwrap_or_else(|| json!([])),
    }))
}

/// Basket total the way the client computes it: each offer's first demand's
/// first price.
fn basket_total(basket: &Value) -> f64 {
    basket
        .get("Offers")
        .and_then(Value::as_array)
        .map(|offers| offers.iter().filter_map(offer_net).sum())
        .unwrap_or(0.0)
}

fn offer_net(offer: &Value) -> Option<f64> {
    offer.get("Demand")?.get(0)?.get("Prices")?.get(0)?.get("Net")?.as_f64()
}

fn order_total(order: &Value) -> f64 {
    order
        .get("OrderItems")
        .and_then(|items| items.get(0))
        .and_then(|item| item.get("OrderLineItems"))
        .and_then(Value::as_array)
        .map(|line_items| {
            line_items
                .iter()
                .filter_map(|line| line.get("Price")?.get("Net")?.as_f64())
                .sum()
        })
        .unwrap_or(0.0)
}
