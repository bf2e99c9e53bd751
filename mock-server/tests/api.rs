use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::app;
use serde_json::{json, Value};
use tower::{Service, ServiceExt};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn token_request() -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/oauth2/accesstoken")
        .header(http::header::AUTHORIZATION, "Basic dGVzdDp0ZXN0")
        .header(
            http::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body("grant_type=client_credentials".to_string())
        .unwrap()
}

fn json_request(method: &str, uri: &str, token: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn get_request(uri: &str, token: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(String::new())
        .unwrap()
}

async fn send<S>(app: &mut S, request: Request<String>) -> axum::response::Response
where
    S: Service<Request<String>, Response = axum::response::Response>,
    S::Error: std::fmt::Debug,
{
    ServiceExt::ready(app)
        .await
        .unwrap()
        .call(request)
        .await
        .unwrap()
}

async fn issue_token<S>(app: &mut S) -> String
where
    S: Service<Request<String>, Response = axum::response::Response>,
    S::Error: std::fmt::Debug,
{
    let resp = send(app, token_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    body["access_token"].as_str().unwrap().to_string()
}

// --- token issuance ---

#[tokio::test]
async fn access_token_issues_bearer() {
    let app = app();
    let resp = app.oneshot(token_request()).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(!body["access_token"].as_str().unwrap().is_empty());
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 3600);
}

#[tokio::test]
async fn access_token_without_credentials_is_401() {
    let app = app();
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/oauth2/accesstoken")
                .body("grant_type=client_credentials".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["Message"], "Client credentials are required");
}

#[tokio::test]
async fn access_token_rejects_other_grants() {
    let app = app();
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/oauth2/accesstoken")
                .header(http::header::AUTHORIZATION, "Basic dGVzdDp0ZXN0")
                .body("grant_type=password".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- bearer enforcement ---

#[tokio::test]
async fn requests_without_bearer_are_rejected() {
    let app = app();
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/baskets/bkt-1?sellerCode=ANMFZ1")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["Message"], "A valid bearer token is required");
}

#[tokio::test]
async fn forged_bearer_is_rejected() {
    let app = app();
    let resp = app
        .oneshot(get_request("/baskets/bkt-1?sellerCode=ANMFZ1", "forged"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- customers ---

#[tokio::test]
async fn customer_lifecycle() {
    let mut app = app().into_service();
    let token = issue_token(&mut app).await;

    let resp = send(
        &mut app,
        json_request(
            "POST",
            "/customers?sellerCode=ANMFZ1",
            &token,
            r#"{"firstname":"ajilan","lastname":"maniyan","nationality":"IN"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let created = body_json(resp).await;
    let id = created["ID"].as_i64().unwrap();
    assert!(id > 0);
    assert_eq!(created["Account"], json!(format!("A{id:05}")));
    assert_eq!(created["AFile"], json!(format!("ANMFZ1-{id:05}")));
    assert_eq!(created["firstname"], "ajilan");

    let resp = send(
        &mut app,
        get_request(&format!("/customers/{id}?sellerCode=ANMFZ1"), &token),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched = body_json(resp).await;
    assert_eq!(fetched, created);

    let resp = send(
        &mut app,
        get_request("/customers/9999?sellerCode=ANMFZ1", &token),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["Message"], "No customer found for the requested customer id");
}

#[tokio::test]
async fn create_customer_requires_seller_code() {
    let mut app = app().into_service();
    let token = issue_token(&mut app).await;

    let resp = send(
        &mut app,
        json_request("POST", "/customers", &token, r#"{"firstname":"ajilan"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["Message"], "sellerCode is required");
}

#[tokio::test]
async fn create_customer_requires_firstname() {
    let mut app = app().into_service();
    let token = issue_token(&mut app).await;

    let resp = send(
        &mut app,
        json_request("POST", "/customers?sellerCode=ANMFZ1", &token, "{}"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- baskets and offers ---

fn basket_body(price_type: &str, quantity: u32) -> String {
    json!({
        "Channel": "W",
        "Seller": "ANMFZ1",
        "Performancecode": "ETES2JN",
        "Area": "A",
        "holdcode": "",
        "Demand": [
            { "PriceTypeCode": price_type, "Quantity": quantity, "Admits": quantity, "Customer": {} },
        ],
        "Fees": [ { "Type": "PF", "Code": "STD" } ],
    })
    .to_string()
}

#[tokio::test]
async fn create_basket_prices_demand() {
    let mut app = app().into_service();
    let token = issue_token(&mut app).await;

    let resp = send(
        &mut app,
        json_request("POST", "/baskets", &token, &basket_body("Q", 2)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let basket = body_json(resp).await;
    assert!(basket["ID"].as_str().unwrap().starts_with("bkt-"));
    assert_eq!(basket["Offers"][0]["Demand"][0]["Prices"][0]["Net"], json!(200.0));
}

#[tokio::test]
async fn create_basket_requires_web_channel() {
    let mut app = app().into_service();
    let token = issue_token(&mut app).await;

    let body = basket_body("Q", 1).replace(r#""Channel":"W""#, r#""Channel":"K""#);
    let resp = send(&mut app, json_request("POST", "/baskets", &token, &body)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["Message"], "Channel must be W");
}

#[tokio::test]
async fn add_offer_appends_to_the_basket() {
    let mut app = app().into_service();
    let token = issue_token(&mut app).await;

    let resp = send(
        &mut app,
        json_request("POST", "/baskets", &token, &basket_body("Q", 1)),
    )
    .await;
    let basket = body_json(resp).await;
    let id = basket["ID"].as_str().unwrap().to_string();

    let resp = send(
        &mut app,
        json_request(
            "POST",
            &format!("/baskets/{id}/offers"),
            &token,
            &basket_body("P", 1),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let updated = body_json(resp).await;
    assert_eq!(updated["Offers"].as_array().unwrap().len(), 2);

    let resp = send(
        &mut app,
        get_request(&format!("/baskets/{id}?sellerCode=ANMFZ1"), &token),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched = body_json(resp).await;
    assert_eq!(fetched["Offers"][1]["Demand"][0]["Prices"][0]["Net"], json!(50.0));
}

#[tokio::test]
async fn unknown_basket_is_404_with_message() {
    let mut app = app().into_service();
    let token = issue_token(&mut app).await;

    let resp = send(
        &mut app,
        get_request("/baskets/bkt-missing?sellerCode=ANMFZ1", &token),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["Message"], "No basket found for the requested basket id");
}

// --- purchase and reversal ---

#[tokio::test]
async fn purchase_and_reverse_lifecycle() {
    let mut app = app().into_service();
    let token = issue_token(&mut app).await;

    let resp = send(
        &mut app,
        json_request("POST", "/baskets", &token, &basket_body("Q", 1)),
    )
    .await;
    let basket = body_json(resp).await;
    let basket_id = basket["ID"].as_str().unwrap().to_string();

    send(
        &mut app,
        json_request(
            "POST",
            &format!("/baskets/{basket_id}/offers"),
            &token,
            &basket_body("P", 1),
        ),
    )
    .await;

    // 100 + 50 from the two offers.
    let purchase = json!({
        "Seller": "ANMFZ1",
        "Payments": [ { "Amount": 150.0, "MeansOfPayment": "EXTERNAL" } ],
        "customer": { "ID": 101, "Account": "A00101", "AFile": "ANMFZ1-00101" },
    })
    .to_string();
    let resp = send(
        &mut app,
        json_request(
            "POST",
            &format!("/Baskets/{basket_id}/purchase"),
            &token,
            &purchase,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order = body_json(resp).await;
    let order_id = order["ID"].as_str().unwrap().to_string();
    assert!(order_id.starts_with("ord-"));
    assert_eq!(order["OrderItems"][0]["OrderLineItems"].as_array().unwrap().len(), 2);
    assert_eq!(order["Customer"]["ID"], json!(101));

    // The basket is consumed by the purchase.
    let resp = send(
        &mut app,
        get_request(&format!("/baskets/{basket_id}?sellerCode=ANMFZ1"), &token),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(
        &mut app,
        get_request(&format!("/orders/{order_id}?sellerCode=ANMFZ1"), &token),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(
        &mut app,
        get_request("/dcal/transync/2017-01-01/2017-12-31?sellerCode=ANMFZ1", &token),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let sync = body_json(resp).await;
    assert_eq!(sync["Transactions"].as_array().unwrap().len(), 1);

    let resp = send(
        &mut app,
        json_request(
            "POST",
            &format!("/orders/{order_id}/reverse"),
            &token,
            &json!({ "Seller": "ANMFZ1", "refunds": 150.0 }).to_string(),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let body = body_bytes(resp).await;
    assert!(body.is_empty());

    let resp = send(
        &mut app,
        get_request(&format!("/orders/{order_id}?sellerCode=ANMFZ1"), &token),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn purchase_rejects_mismatched_payment() {
    let mut app = app().into_service();
    let token = issue_token(&mut app).await;

    let resp = send(
        &mut app,
        json_request("POST", "/baskets", &token, &basket_body("Q", 1)),
    )
    .await;
    let basket = body_json(resp).await;
    let basket_id = basket["ID"].as_str().unwrap().to_string();

    let purchase = json!({
        "Seller": "ANMFZ1",
        "Payments": [ { "Amount": 50.0, "MeansOfPayment": "EXTERNAL" } ],
    })
    .to_string();
    let resp = send(
        &mut app,
        json_request(
            "POST",
            &format!("/Baskets/{basket_id}/purchase"),
            &token,
            &purchase,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["Message"], "Payment amount does not match the basket total");
}

#[tokio::test]
async fn reverse_rejects_mismatched_refund() {
    let mut app = app().into_service();
    let token = issue_token(&mut app).await;

    let resp = send(
        &mut app,
        json_request("POST", "/baskets", &token, &basket_body("Q", 1)),
    )
    .await;
    let basket = body_json(resp).await;
    let basket_id = basket["ID"].as_str().unwrap().to_string();

    let purchase = json!({
        "Seller": "ANMFZ1",
        "Payments": [ { "Amount": 100.0, "MeansOfPayment": "EXTERNAL" } ],
    })
    .to_string();
    let resp = send(
        &mut app,
        json_request(
            "POST",
            &format!("/Baskets/{basket_id}/purchase"),
            &token,
            &purchase,
        ),
    )
    .await;
    let order = body_json(resp).await;
    let order_id = order["ID"].as_str().unwrap().to_string();

    let resp = send(
        &mut app,
        json_request(
            "POST",
            &format!("/orders/{order_id}/reverse"),
            &token,
            &json!({ "Seller": "ANMFZ1", "refunds": 10.0 }).to_string(),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["Message"], "Refund amount does not match the order total");
}

#[tokio::test]
async fn purchase_of_unknown_basket_is_404() {
    let mut app = app().into_service();
    let token = issue_token(&mut app).await;

    let purchase = json!({
        "Seller": "ANMFZ1",
        "Payments": [ { "Amount": 0.0, "MeansOfPayment": "EXTERNAL" } ],
    })
    .to_string();
    let resp = send(
        &mut app,
        json_request("POST", "/Baskets/bkt-missing/purchase", &token, &purchase),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- performances ---

#[tokio::test]
async fn performance_endpoints_report_the_price_table() {
    let mut app = app().into_service();
    let token = issue_token(&mut app).await;

    let resp = send(
        &mut app,
        get_request(
            "/performances/ETES2JN/availabilities?channel=W&sellerCode=ANMFZ1",
            &token,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let availabilities = body_json(resp).await;
    assert_eq!(availabilities["PerformanceCode"], "ETES2JN");
    assert!(!availabilities["Availabilities"].as_array().unwrap().is_empty());

    let resp = send(
        &mut app,
        get_request(
            "/performances/ETES2JN/prices?channel=W&sellerCode=ANMFZ1",
            &token,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let prices = body_json(resp).await;
    assert_eq!(prices["Prices"][0]["PriceTypeCode"], "Q");
    assert_eq!(prices["Prices"][0]["Net"], json!(100.0));
}

#[tokio::test]
async fn transaction_sync_requires_seller_code() {
    let mut app = app().into_service();
    let token = issue_token(&mut app).await;

    let resp = send(
        &mut app,
        get_request("/dcal/transync/2017-01-01/2017-12-31", &token),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
