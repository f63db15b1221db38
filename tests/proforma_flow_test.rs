//! Proforma invoice lifecycle: reservation on create, restore-then-reapply
//! on update, draft-only delete, invoice-number immutability.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{DateTime, Utc};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;

use common::{decimal_at, TestApp};

fn bill_info(name: &str) -> Value {
    json!({
        "name": name,
        "company_name": format!("{name} Ltd"),
        "street_address": "12 Harbour Rd",
        "city_state_zip": "Tema, GA 00233",
        "phone": "+233200000000",
    })
}

fn proforma_payload(items: Value) -> Value {
    json!({
        "bill_from": bill_info("Stockroom"),
        "bill_to": bill_info("Customer"),
        "items": items,
        "sales_tax": 5,
        "other": 0,
    })
}

async fn create_proforma(app: &TestApp, items: Value) -> (StatusCode, Value) {
    app.admin_request(Method::POST, "/api/v1/proforma", Some(proforma_payload(items)))
        .await
}

#[tokio::test]
async fn create_reserves_stock_and_computes_totals() {
    let app = TestApp::new().await;
    let seller = app.seed_seller().await;
    let category = app.seed_category().await;
    let p1 = app.seed_product(seller, category, dec!(25), 10).await;
    let p2 = app.seed_product(seller, category, dec!(10), 8).await;

    let (status, body) = create_proforma(
        &app,
        json!([
            { "product": p1, "description": "widgets", "quantity": 4, "price": 25 },
            { "product": p2, "description": "gizmos", "quantity": 2, "price": 10 },
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body: {body}");

    // Line items are reserved against stock at creation.
    assert_eq!(app.stock_of(p1).await, 6);
    assert_eq!(app.stock_of(p2).await, 6);

    // total = subtotal + sales tax + other.
    assert_eq!(decimal_at(&body, "/subtotal"), dec!(120));
    assert_eq!(decimal_at(&body, "/total"), dec!(125));
    assert_eq!(body["status"], "draft");

    let invoice_number = body["invoice_number"].as_str().unwrap();
    assert!(invoice_number.starts_with("INV"));

    // Due date is issue date + 30 days by default.
    let date: DateTime<Utc> = body["date"].as_str().unwrap().parse().unwrap();
    let due: DateTime<Utc> = body["due_date"].as_str().unwrap().parse().unwrap();
    assert_eq!((due - date).num_days(), 30);

    // Read-back returns the same invoice with its items.
    let id = body["id"].as_str().unwrap();
    let (status, fetched) = app
        .admin_request(Method::GET, &format!("/api/v1/proforma/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["invoice_number"], body["invoice_number"]);
    assert_eq!(fetched["items"].as_array().unwrap().len(), 2);
    let item_sum: rust_decimal::Decimal = fetched["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| decimal_at(item, "/total"))
        .sum();
    assert_eq!(item_sum, decimal_at(&fetched, "/subtotal"));
}

#[tokio::test]
async fn create_rolls_back_every_reservation_on_shortfall() {
    let app = TestApp::new().await;
    let seller = app.seed_seller().await;
    let category = app.seed_category().await;
    let plentiful = app.seed_product(seller, category, dec!(25), 10).await;
    let scarce = app.seed_product(seller, category, dec!(10), 1).await;

    let (status, body) = create_proforma(
        &app,
        json!([
            { "product": plentiful, "description": "widgets", "quantity": 4, "price": 25 },
            { "product": scarce, "description": "gizmos", "quantity": 5, "price": 10 },
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "insufficient_stock");

    // The first item's reservation must not survive the abort.
    assert_eq!(app.stock_of(plentiful).await, 10);
    assert_eq!(app.stock_of(scarce).await, 1);
}

#[tokio::test]
async fn invoice_number_is_immutable() {
    let app = TestApp::new().await;
    let seller = app.seed_seller().await;
    let category = app.seed_category().await;
    let product = app.seed_product(seller, category, dec!(25), 10).await;

    let (_, body) = create_proforma(
        &app,
        json!([{ "product": product, "description": "widgets", "quantity": 1, "price": 25 }]),
    )
    .await;
    let id = body["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .admin_request(
            Method::PATCH,
            &format!("/api/v1/proforma/{id}"),
            Some(json!({ "invoice_number": "INV209901-DEADBEEF" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "immutable_field");

    let (status, body) = app
        .admin_request(
            Method::PATCH,
            &format!("/api/v1/proforma/{id}"),
            Some(json!({ "invoice_details": { "invoice_no": "INV209901-DEADBEEF" } })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "immutable_field");
}

#[tokio::test]
async fn identical_item_update_nets_zero_stock_delta() {
    let app = TestApp::new().await;
    let seller = app.seed_seller().await;
    let category = app.seed_category().await;
    let product = app.seed_product(seller, category, dec!(25), 10).await;

    let items = json!([
        { "product": product, "description": "widgets", "quantity": 4, "price": 25 }
    ]);
    let (_, body) = create_proforma(&app, items.clone()).await;
    let id = body["id"].as_str().unwrap().to_string();
    assert_eq!(app.stock_of(product).await, 6);

    let (status, _) = app
        .admin_request(
            Method::PATCH,
            &format!("/api/v1/proforma/{id}"),
            Some(json!({ "items": items })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.stock_of(product).await, 6);
}

#[tokio::test]
async fn item_update_restores_then_reapplies() {
    let app = TestApp::new().await;
    let seller = app.seed_seller().await;
    let category = app.seed_category().await;
    let product = app.seed_product(seller, category, dec!(25), 10).await;

    let (_, body) = create_proforma(
        &app,
        json!([{ "product": product, "description": "widgets", "quantity": 4, "price": 25 }]),
    )
    .await;
    let id = body["id"].as_str().unwrap().to_string();
    assert_eq!(app.stock_of(product).await, 6);

    // Shrinking the reservation returns the difference to stock and
    // recomputes the totals.
    let (status, body) = app
        .admin_request(
            Method::PATCH,
            &format!("/api/v1/proforma/{id}"),
            Some(json!({
                "items": [{ "product": product, "description": "widgets", "quantity": 1, "price": 25 }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.stock_of(product).await, 9);
    assert_eq!(decimal_at(&body, "/subtotal"), dec!(25));
    assert_eq!(decimal_at(&body, "/total"), dec!(30));
}

#[tokio::test]
async fn failed_item_update_leaves_original_reservation() {
    let app = TestApp::new().await;
    let seller = app.seed_seller().await;
    let category = app.seed_category().await;
    let product = app.seed_product(seller, category, dec!(25), 10).await;

    let (_, body) = create_proforma(
        &app,
        json!([{ "product": product, "description": "widgets", "quantity": 4, "price": 25 }]),
    )
    .await;
    let id = body["id"].as_str().unwrap().to_string();
    assert_eq!(app.stock_of(product).await, 6);

    // 6 in stock + 4 restored = 10 available, so 11 must fail; the abort
    // puts the original reservation back.
    let (status, body) = app
        .admin_request(
            Method::PATCH,
            &format!("/api/v1/proforma/{id}"),
            Some(json!({
                "items": [{ "product": product, "description": "widgets", "quantity": 11, "price": 25 }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "insufficient_stock");
    assert_eq!(app.stock_of(product).await, 6);
}

#[tokio::test]
async fn delete_is_draft_only_and_restores_stock() {
    let app = TestApp::new().await;
    let seller = app.seed_seller().await;
    let category = app.seed_category().await;
    let product = app.seed_product(seller, category, dec!(25), 10).await;

    let (_, body) = create_proforma(
        &app,
        json!([{ "product": product, "description": "widgets", "quantity": 4, "price": 25 }]),
    )
    .await;
    let id = body["id"].as_str().unwrap().to_string();
    assert_eq!(app.stock_of(product).await, 6);

    // Once sent, the invoice refuses deletion and stock stays reserved.
    let (status, _) = app
        .admin_request(
            Method::PATCH,
            &format!("/api/v1/proforma/{id}/status"),
            Some(json!({ "status": "sent" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .admin_request(Method::DELETE, &format!("/api/v1/proforma/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "precondition_failed");
    assert_eq!(app.stock_of(product).await, 6);

    // Back to draft, deletion releases the reservation.
    let (status, _) = app
        .admin_request(
            Method::PATCH,
            &format!("/api/v1/proforma/{id}/status"),
            Some(json!({ "status": "draft" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .admin_request(Method::DELETE, &format!("/api/v1/proforma/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.stock_of(product).await, 10);

    let (status, _) = app
        .admin_request(Method::GET, &format!("/api/v1/proforma/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_missing_proforma_is_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app
        .admin_request(
            Method::DELETE,
            &format!("/api/v1/proforma/{}", Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn list_filters_by_status_and_paginates() {
    let app = TestApp::new().await;
    let seller = app.seed_seller().await;
    let category = app.seed_category().await;
    let product = app.seed_product(seller, category, dec!(25), 100).await;

    for _ in 0..3 {
        let (status, _) = create_proforma(
            &app,
            json!([{ "product": product, "description": "widgets", "quantity": 1, "price": 25 }]),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .admin_request(Method::GET, "/api/v1/proforma?status=draft&limit=2", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total_items"], 3);
    assert_eq!(body["pagination"]["total_pages"], 2);
    assert_eq!(body["pagination"]["has_next_page"], true);

    let (status, body) = app
        .admin_request(Method::GET, "/api/v1/proforma?status=paid", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["pagination"]["total_items"], 0);
}
