//! Integration tests for the API server.

use std::sync::Arc;
use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::InMemoryStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    let state = Arc::new(api::AppState {
        store: InMemoryStore::new(),
    });
    api::create_app(state, get_metrics_handle())
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Seeds a product and returns its id.
async fn seed_product(app: &axum::Router, price_cents: i64, stock: i64) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/products",
        Some(json!({
            "name": format!("widget-{price_cents}"),
            "price_cents": price_cents,
            "stock_quantity": stock
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["product_id"].as_str().unwrap().to_string()
}

/// Registers a user and returns their id.
async fn seed_user(app: &axum::Router, email: &str) -> String {
    let (status, body) = send(app, "POST", "/users", Some(json!({ "email": email }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["user_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_and_list_products() {
    let app = setup();
    let product_id = seed_product(&app, 1000, 5).await;

    let (status, body) = send(&app, "GET", "/products", None).await;
    assert_eq!(status, StatusCode::OK);
    let products = body.as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["product_id"], product_id.as_str());
    assert_eq!(products[0]["price"], "10.00");
    assert_eq!(products[0]["stock_quantity"], 5);
}

#[tokio::test]
async fn test_create_product_rejects_bad_fields() {
    let app = setup();

    let (status, body) = send(
        &app,
        "POST",
        "/products",
        Some(json!({ "name": "", "price_cents": 1000, "stock_quantity": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());

    let (status, _) = send(
        &app,
        "POST",
        "/products",
        Some(json!({ "name": "widget", "price_cents": 0, "stock_quantity": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_get_or_create() {
    let app = setup();

    let (status, first) = send(
        &app,
        "POST",
        "/users",
        Some(json!({ "email": "carol@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["username"], "carol");

    // Same email again: 200 with the same id.
    let (status, second) = send(
        &app,
        "POST",
        "/users",
        Some(json!({ "email": "carol@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["user_id"], first["user_id"]);
}

#[tokio::test]
async fn test_user_rejects_invalid_email() {
    let app = setup();

    let (status, body) = send(&app, "POST", "/users", Some(json!({ "email": "nope" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Valid email is required");
}

#[tokio::test]
async fn test_place_order_happy_path() {
    let app = setup();
    let user_id = seed_user(&app, "dave@example.com").await;
    let product_id = seed_product(&app, 1000, 5).await;

    let (status, body) = send(
        &app,
        "POST",
        "/orders",
        Some(json!({
            "user_id": user_id,
            "items": [{ "product_id": product_id, "quantity": 3 }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Order created");
    assert_eq!(body["total_amount"], "30.00");
    assert_eq!(body["total_cents"], 3000);
    assert!(body["order_id"].as_str().is_some());
    assert_eq!(body["items"][0]["price_at_time"], "10.00");

    // Stock was depleted.
    let (_, products) = send(&app, "GET", "/products", None).await;
    assert_eq!(products[0]["stock_quantity"], 2);
}

#[tokio::test]
async fn test_place_order_empty_items_is_400() {
    let app = setup();
    let user_id = seed_user(&app, "erin@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/orders",
        Some(json!({ "user_id": user_id, "items": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("at least one item"));
}

#[tokio::test]
async fn test_place_order_zero_quantity_is_400() {
    let app = setup();
    let user_id = seed_user(&app, "frank@example.com").await;
    let product_id = seed_product(&app, 1000, 5).await;

    let (status, _) = send(
        &app,
        "POST",
        "/orders",
        Some(json!({
            "user_id": user_id,
            "items": [{ "product_id": product_id, "quantity": 0 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_place_order_unknown_product_is_404_naming_id() {
    let app = setup();
    let user_id = seed_user(&app, "grace@example.com").await;
    let known = seed_product(&app, 1000, 5).await;
    let unknown = uuid::Uuid::new_v4().to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/orders",
        Some(json!({
            "user_id": user_id,
            "items": [
                { "product_id": known, "quantity": 1 },
                { "product_id": unknown, "quantity": 1 }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains(&unknown));

    // Nothing was charged, not even the valid line.
    let (_, products) = send(&app, "GET", "/products", None).await;
    assert_eq!(products[0]["stock_quantity"], 5);
    let (_, orders) = send(&app, "GET", &format!("/orders?user_id={user_id}"), None).await;
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_place_order_insufficient_stock_is_400_naming_product() {
    let app = setup();
    let user_id = seed_user(&app, "heidi@example.com").await;
    let product_id = seed_product(&app, 1000, 2).await;

    let (status, body) = send(
        &app,
        "POST",
        "/orders",
        Some(json!({
            "user_id": user_id,
            "items": [{ "product_id": product_id, "quantity": 3 }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("insufficient stock"));
    assert!(message.contains(&product_id));
}

#[tokio::test]
async fn test_list_orders_requires_user_id() {
    let app = setup();

    let (status, body) = send(&app, "GET", "/orders", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "user_id is required");
}

#[tokio::test]
async fn test_list_orders_is_idempotent() {
    let app = setup();
    let user_id = seed_user(&app, "ivan@example.com").await;
    let product_id = seed_product(&app, 500, 10).await;

    for quantity in [2, 1] {
        let (status, _) = send(
            &app,
            "POST",
            "/orders",
            Some(json!({
                "user_id": user_id,
                "items": [{ "product_id": product_id, "quantity": quantity }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let uri = format!("/orders?user_id={user_id}");
    let (status, first) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = send(&app, "GET", &uri, None).await;
    assert_eq!(first, second);

    let orders = first.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["total_amount"], "10.00");
    assert_eq!(orders[0]["status"], "created");
    assert_eq!(orders[1]["total_amount"], "5.00");
}

#[tokio::test]
async fn test_price_at_time_survives_catalog_price_change() {
    // Catalog price changes after placement must not rewrite history;
    // the in-memory store has no price-update operation, so this checks
    // the receipt price equals the price at placement.
    let app = setup();
    let user_id = seed_user(&app, "judy@example.com").await;
    let product_id = seed_product(&app, 1234, 10).await;

    let (_, body) = send(
        &app,
        "POST",
        "/orders",
        Some(json!({
            "user_id": user_id,
            "items": [{ "product_id": product_id, "quantity": 2 }]
        })),
    )
    .await;
    assert_eq!(body["items"][0]["price_at_time_cents"], 1234);
    assert_eq!(body["total_cents"], 2468);
}
