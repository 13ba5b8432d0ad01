use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Datelike, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;

use delivery_admin::api::rest::router;
use delivery_admin::config::Config;
use delivery_admin::state::AppState;
use delivery_admin::store::MemoryStore;

fn setup() -> axum::Router {
    let store = Arc::new(MemoryStore::new(1024));
    let state = Arc::new(AppState::new(store, &Config::default()));
    router(state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn delete_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn order_payload() -> Value {
    json!({
        "customer_name": "Amal",
        "shipping_info": {
            "address": "12 Nile St",
            "city": "Khartoum",
            "phone": "+249912345678"
        },
        "payment_method": "cash",
        "products_list": [
            { "name": "Margherita", "cost": 100.0, "quantity": 2, "category": "pizza" },
            { "name": "Cola", "cost": 50.0, "quantity": 1, "category": "drinks" }
        ]
    })
}

async fn create_order(app: &axum::Router) -> Value {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/orders", order_payload()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

async fn set_status(app: &axum::Router, id: &str, status: &str) -> axum::response::Response {
    app.clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/orders/{id}/status"),
            json!({ "status": status }),
        ))
        .await
        .unwrap()
}

async fn deliver(app: &axum::Router, id: &str) -> Value {
    let response = set_status(app, id, "Shipped").await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = set_status(app, id, "Delivered").await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

async fn create_product(app: &axum::Router, name: &str, category: &str, cost: f64) -> Value {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/products",
            json!({
                "name": name,
                "category": category,
                "cost": cost,
                "quantity": 10
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
async fn health_returns_ok() {
    let app = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["orders"], 0);
    assert_eq!(body["products"], 0);
    assert_eq!(body["offers"], 0);
    assert_eq!(body["drivers"], 0);
    assert_eq!(body["users"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let app = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("order_feed_clients"));
}

#[tokio::test]
async fn create_order_starts_processing() {
    let app = setup();
    let order = create_order(&app).await;

    assert_eq!(order["status"], "Processing");
    assert_eq!(order["total_amount"], 250.0);
    assert_eq!(order["revision"], 0);
    assert!(order["delivered_at"].is_null());
    assert!(order["driver_id"].is_null());
    assert_eq!(order["is_offer"], false);
    assert!(order["id"].as_str().unwrap().len() > 0);
}

#[tokio::test]
async fn create_order_without_line_items_returns_400() {
    let app = setup();
    let mut payload = order_payload();
    payload["products_list"] = json!([]);

    let response = app
        .oneshot(json_request("POST", "/api/orders", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_order_with_zero_quantity_returns_400() {
    let app = setup();
    let mut payload = order_payload();
    payload["products_list"][0]["quantity"] = json!(0);

    let response = app
        .oneshot(json_request("POST", "/api/orders", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_nonexistent_order_returns_404() {
    let app = setup();
    let response = app
        .oneshot(get_request("/api/orders/00000000-0000-0000-0000-000000000000"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delivery_flow_stamps_delivered_at() {
    let app = setup();
    let order = create_order(&app).await;
    let id = order["id"].as_str().unwrap();

    let delivered = deliver(&app, id).await;
    assert_eq!(delivered["status"], "Delivered");
    assert!(delivered["delivered_at"].is_string());
}

#[tokio::test]
async fn skipping_shipped_returns_422() {
    let app = setup();
    let order = create_order(&app).await;
    let id = order["id"].as_str().unwrap();

    let response = set_status(&app, id, "Delivered").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn delivered_orders_reject_further_transitions() {
    let app = setup();
    let order = create_order(&app).await;
    let id = order["id"].as_str().unwrap();
    deliver(&app, id).await;

    let response = set_status(&app, id, "Cancelled").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn same_status_write_is_a_noop() {
    let app = setup();
    let order = create_order(&app).await;
    let id = order["id"].as_str().unwrap();

    let response = set_status(&app, id, "Processing").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["revision"], 0);
    assert!(body["delivered_at"].is_null());
}

#[tokio::test]
async fn list_orders_filters_by_status() {
    let app = setup();
    let first = create_order(&app).await;
    create_order(&app).await;
    deliver(&app, first["id"].as_str().unwrap()).await;

    let response = app
        .clone()
        .oneshot(get_request("/api/orders?status=Delivered"))
        .await
        .unwrap();
    let delivered = body_json(response).await;
    assert_eq!(delivered.as_array().unwrap().len(), 1);

    let response = app.oneshot(get_request("/api/orders")).await.unwrap();
    let all = body_json(response).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn delete_order_then_404() {
    let app = setup();
    let order = create_order(&app).await;
    let id = order["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(delete_request(&format!("/api/orders/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(get_request(&format!("/api/orders/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn driver_assignment_flow() {
    let app = setup();
    let order = create_order(&app).await;
    let order_id = order["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/drivers",
            json!({
                "name": "Musa",
                "email": "musa@example.com",
                "phone": "+249900000000",
                "vehicle": "KRT-1122"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let driver = body_json(response).await;
    assert_eq!(driver["status"], "Active");
    let driver_id = driver["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/orders/{order_id}/driver"),
            json!({ "driver_id": driver_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let assigned = body_json(response).await;
    assert_eq!(assigned["driver_id"], driver_id.as_str());

    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/drivers/{driver_id}")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["current_orders"], json!([order_id]));

    deliver(&app, order_id).await;

    let response = app
        .oneshot(get_request(&format!("/api/drivers/{driver_id}")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["current_orders"], json!([]));
}

#[tokio::test]
async fn inactive_driver_cannot_be_assigned() {
    let app = setup();
    let order = create_order(&app).await;
    let order_id = order["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/drivers",
            json!({
                "name": "Idle",
                "email": "idle@example.com",
                "phone": "+249911111111",
                "vehicle": "KRT-9999",
                "status": "Inactive"
            }),
        ))
        .await
        .unwrap();
    let driver = body_json(response).await;
    let driver_id = driver["id"].as_str().unwrap();

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/api/orders/{order_id}/driver"),
            json!({ "driver_id": driver_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn deleting_a_driver_releases_assigned_orders() {
    let app = setup();
    let order = create_order(&app).await;
    let order_id = order["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/drivers",
            json!({
                "name": "Musa",
                "email": "musa@example.com",
                "phone": "+249900000000",
                "vehicle": "KRT-1122"
            }),
        ))
        .await
        .unwrap();
    let driver = body_json(response).await;
    let driver_id = driver["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/orders/{order_id}/driver"),
            json!({ "driver_id": driver_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(delete_request(&format!("/api/drivers/{driver_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(get_request(&format!("/api/orders/{order_id}")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body["driver_id"].is_null());
}

#[tokio::test]
async fn create_product_with_empty_name_returns_400() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/products",
            json!({ "name": "  ", "category": "pizza", "cost": 100.0 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_product_category_falls_back() {
    let app = setup();
    let product = create_product(&app, "Mystery Box", "webcams", 50.0).await;
    assert_eq!(product["category"], "unknown");
}

#[tokio::test]
async fn product_listing_filters_by_name_prefix_and_category() {
    let app = setup();
    create_product(&app, "Margherita", "pizza", 450.0).await;
    create_product(&app, "Pepperoni", "pizza", 520.0).await;
    create_product(&app, "Cola", "drinks", 80.0).await;

    let response = app
        .clone()
        .oneshot(get_request("/api/products?category=pizza"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(get_request("/api/products?name=Marg"))
        .await
        .unwrap();
    let body = body_json(response).await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["name"], "Margherita");

    let response = app
        .oneshot(get_request("/api/products?limit=1"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn featured_toggle_flips() {
    let app = setup();
    let product = create_product(&app, "Margherita", "pizza", 450.0).await;
    let id = product["id"].as_str().unwrap();
    assert_eq!(product["is_featured"], false);

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/products/{id}/featured"),
            json!({}),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["is_featured"], true);
}

#[tokio::test]
async fn offer_reports_original_price_and_savings() {
    let app = setup();
    let p1 = create_product(&app, "Family Pizza", "pizza", 300.0).await;
    let p2 = create_product(&app, "Cola", "drinks", 150.0).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/offers",
            json!({
                "title": "Family Deal",
                "description": "Pizza plus drinks",
                "image": "https://img.example/family.jpg",
                "price": 500.0,
                "products": [
                    { "product_id": p1["id"], "quantity": 1 },
                    { "product_id": p2["id"], "quantity": 2 }
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let offer = body_json(response).await;
    assert_eq!(offer["original_price"], 600.0);
    assert_eq!(offer["price"], 500.0);
    assert_eq!(offer["savings"], 100.0);
}

#[tokio::test]
async fn overpriced_offer_reports_negative_savings() {
    let app = setup();
    let p1 = create_product(&app, "Family Pizza", "pizza", 300.0).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/offers",
            json!({
                "title": "Markup Deal",
                "description": "",
                "image": "https://img.example/markup.jpg",
                "price": 450.0,
                "products": [ { "product_id": p1["id"], "quantity": 1 } ]
            }),
        ))
        .await
        .unwrap();

    let offer = body_json(response).await;
    assert_eq!(offer["savings"], -150.0);
}

#[tokio::test]
async fn offer_with_zero_quantity_returns_400() {
    let app = setup();
    let p1 = create_product(&app, "Family Pizza", "pizza", 300.0).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/offers",
            json!({
                "title": "Broken Deal",
                "description": "",
                "image": "https://img.example/broken.jpg",
                "products": [ { "product_id": p1["id"], "quantity": 0 } ]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn offer_without_price_defaults_to_constituent_total() {
    let app = setup();
    let p1 = create_product(&app, "Family Pizza", "pizza", 300.0).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/offers",
            json!({
                "title": "Plain Deal",
                "description": "",
                "image": "https://img.example/plain.jpg",
                "products": [ { "product_id": p1["id"], "quantity": 2 } ]
            }),
        ))
        .await
        .unwrap();

    let offer = body_json(response).await;
    assert_eq!(offer["price"], 600.0);
    assert_eq!(offer["savings"], 0.0);
}

#[tokio::test]
async fn offer_order_snapshots_the_bundle() {
    let app = setup();
    let p1 = create_product(&app, "Family Pizza", "pizza", 300.0).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/offers",
            json!({
                "title": "Family Deal",
                "description": "",
                "image": "https://img.example/family.jpg",
                "price": 500.0,
                "products": [ { "product_id": p1["id"], "quantity": 2 } ]
            }),
        ))
        .await
        .unwrap();
    let offer = body_json(response).await;

    let mut payload = order_payload();
    payload["products_list"] = json!([]);
    payload["offer_id"] = offer["id"].clone();

    let response = app
        .oneshot(json_request("POST", "/api/orders", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let order = body_json(response).await;
    assert_eq!(order["is_offer"], true);
    assert_eq!(order["total_amount"], 500.0);
    assert_eq!(order["offer_title"], "Family Deal");
    assert_eq!(order["products_list"][0]["name"], "Family Pizza");
    assert_eq!(order["products_list"][0]["quantity"], 2);
}

#[tokio::test]
async fn section_stats_count_only_delivered_revenue() {
    let app = setup();
    create_product(&app, "Margherita", "pizza", 450.0).await;
    create_product(&app, "Cola", "drinks", 80.0).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/users/amal@example.com",
            json!({ "name": "Amal" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let delivered = create_order(&app).await;
    deliver(&app, delivered["id"].as_str().unwrap()).await;
    create_order(&app).await; // still Processing: no revenue

    let response = app.oneshot(get_request("/api/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cache_control = response
        .headers()
        .get("cache-control")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cache_control.contains("stale-while-revalidate"));

    let body = body_json(response).await;
    assert_eq!(body["orders"], 1);
    assert_eq!(body["products"], 2);
    assert_eq!(body["customers"], 1);
    assert_eq!(body["revenue"], 250.0);
}

#[tokio::test]
async fn sales_requires_a_date_parameter() {
    let app = setup();

    let response = app
        .clone()
        .oneshot(get_request("/api/stats/sales"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(get_request("/api/stats/sales?date=garbage"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sales_buckets_delivered_orders_by_day() {
    let app = setup();
    let order = create_order(&app).await;
    deliver(&app, order["id"].as_str().unwrap()).await;

    let now = Utc::now();
    let month = now.format("%Y-%m").to_string();

    let response = app
        .oneshot(get_request(&format!("/api/stats/sales?date={month}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let series = body.as_array().unwrap();
    assert!(series.len() >= 28);

    let mut total_sales = 0.0;
    let mut total_orders = 0;
    for (index, entry) in series.iter().enumerate() {
        assert_eq!(entry["day"], index as u64 + 1);
        assert_eq!(entry["month"], month.as_str());
        total_sales += entry["sales"].as_f64().unwrap();
        total_orders += entry["orders"].as_u64().unwrap();
    }
    assert_eq!(total_sales, 250.0);
    assert_eq!(total_orders, 1);

    let today = &series[now.day() as usize - 1];
    assert_eq!(today["sales"], 250.0);
    assert_eq!(today["orders"], 1);
}

#[tokio::test]
async fn offer_stats_sorted_by_count() {
    let app = setup();
    let p1 = create_product(&app, "Family Pizza", "pizza", 300.0).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/offers",
            json!({
                "title": "Family Deal",
                "description": "",
                "image": "https://img.example/family.jpg",
                "price": 500.0,
                "products": [ { "product_id": p1["id"], "quantity": 1 } ]
            }),
        ))
        .await
        .unwrap();
    let offer = body_json(response).await;
    let offer_id = offer["id"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let mut payload = order_payload();
        payload["products_list"] = json!([]);
        payload["offer_id"] = json!(offer_id);
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/orders", payload))
            .await
            .unwrap();
        let order = body_json(response).await;
        deliver(&app, order["id"].as_str().unwrap()).await;
    }

    let response = app.oneshot(get_request("/api/stats/offers")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["offer_id"], offer_id.as_str());
    assert_eq!(list[0]["offer_title"], "Family Deal");
    assert_eq!(list[0]["count"], 2);
    assert_eq!(list[0]["revenue"], 1000.0);
}

#[tokio::test]
async fn category_stats_sum_catalog_quantities() {
    let app = setup();
    create_product(&app, "Margherita", "pizza", 450.0).await;
    create_product(&app, "Pepperoni", "pizza", 520.0).await;
    create_product(&app, "Cola", "drinks", 80.0).await;

    let response = app
        .oneshot(get_request("/api/stats/categories"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["category"], "pizza");
    assert_eq!(list[0]["quantity"], 20);
    assert_eq!(list[1]["category"], "drinks");
    assert_eq!(list[1]["quantity"], 10);
}

#[tokio::test]
async fn user_upsert_merges_fields() {
    let app = setup();

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/users/amal@example.com",
            json!({
                "name": "Amal",
                "shipping_info": {
                    "address": "12 Nile St",
                    "city": "Khartoum",
                    "phone": "+249912345678"
                }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/users/amal@example.com",
            json!({ "image": "https://img.example/amal.jpg" }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["name"], "Amal");
    assert_eq!(body["image"], "https://img.example/amal.jpg");
    assert_eq!(body["shipping_info"]["city"], "Khartoum");

    let response = app
        .oneshot(get_request("/api/users/amal@example.com"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
