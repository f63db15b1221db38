//! Product lifecycle over HTTP: measurement validation, stock replenishment
//! with its mirrored purchase record, and role gating.

mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;

use common::{decimal_at, TestApp};
use stockroom_api::entities::user::Role;

fn product_payload(seller: uuid::Uuid, category: uuid::Uuid) -> serde_json::Value {
    json!({
        "seller": seller,
        "category": category,
        "name": "Bag of rice",
        "price": 120,
        "stock": 7,
        "images": ["https://img.example.com/rice.jpg"],
    })
}

#[tokio::test]
async fn create_product_validates_measurement_units() {
    let app = TestApp::new().await;
    let seller = app.seed_seller().await;
    let category = app.seed_category().await;

    let mut payload = product_payload(seller, category);
    payload["measurement"] = json!({ "type": "weight", "unit": "cm", "value": 25 });

    let (status, body) = app
        .admin_request(Method::POST, "/api/v1/products", Some(payload))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_measurement");

    // A unit drawn from the declared type's set is accepted.
    let mut payload = product_payload(seller, category);
    payload["measurement"] = json!({ "type": "weight", "unit": "kg", "value": 25 });

    let (status, body) = app
        .admin_request(Method::POST, "/api/v1/products", Some(payload))
        .await;
    assert_eq!(status, StatusCode::CREATED, "body: {body}");
    assert_eq!(body["measurement_unit"], "kg");
}

#[tokio::test]
async fn create_product_requires_existing_seller() {
    let app = TestApp::new().await;
    let category = app.seed_category().await;

    let (status, body) = app
        .admin_request(
            Method::POST,
            "/api/v1/products",
            Some(product_payload(uuid::Uuid::new_v4(), category)),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn add_to_stock_increments_and_mirrors_a_purchase() {
    let app = TestApp::new().await;
    let seller = app.seed_seller().await;
    let category = app.seed_category().await;
    let product = app.seed_product(seller, category, dec!(120), 7).await;

    let (status, body) = app
        .admin_request(
            Method::PATCH,
            &format!("/api/v1/products/{product}/add"),
            Some(json!({ "seller": seller, "stock": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["stock"], 12);
    assert_eq!(app.stock_of(product).await, 12);

    // The increment is mirrored by a purchase record at the current price.
    let purchases = app.purchases_for(product).await;
    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0].quantity, 5);
    assert_eq!(purchases[0].unit_price, dec!(120));
    assert_eq!(purchases[0].total_price, dec!(600));
}

#[tokio::test]
async fn add_to_stock_rejects_non_positive_quantities() {
    let app = TestApp::new().await;
    let seller = app.seed_seller().await;
    let category = app.seed_category().await;
    let product = app.seed_product(seller, category, dec!(120), 7).await;

    let (status, body) = app
        .admin_request(
            Method::PATCH,
            &format!("/api/v1/products/{product}/add"),
            Some(json!({ "seller": seller, "stock": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
    assert_eq!(app.stock_of(product).await, 7);
    assert!(app.purchases_for(product).await.is_empty());
}

#[tokio::test]
async fn product_deletion_is_admin_only() {
    let app = TestApp::new().await;
    let seller = app.seed_seller().await;
    let category = app.seed_category().await;
    let product = app.seed_product(seller, category, dec!(120), 7).await;

    let keeper_token = app.token_for(Role::Keeper).await;
    let (status, body) = app
        .request(
            Method::DELETE,
            &format!("/api/v1/products/{product}"),
            None,
            Some(&keeper_token),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let (status, _) = app
        .admin_request(Method::DELETE, &format!("/api/v1/products/{product}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .admin_request(Method::GET, &format!("/api/v1/products/{product}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn plain_users_cannot_create_products() {
    let app = TestApp::new().await;
    let seller = app.seed_seller().await;
    let category = app.seed_category().await;

    let user_token = app.token_for(Role::User).await;
    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(product_payload(seller, category)),
            Some(&user_token),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");
}

#[tokio::test]
async fn missing_or_garbage_tokens_are_unauthorized() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(Method::GET, "/api/v1/products", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let (status, _) = app
        .request(Method::GET, "/api/v1/products", None, Some("not-a-jwt"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn product_summary_values_the_inventory() {
    let app = TestApp::new().await;
    let seller = app.seed_seller().await;
    let category = app.seed_category().await;
    app.seed_product(seller, category, dec!(10), 4).await;
    app.seed_product(seller, category, dec!(50), 2).await;

    let (status, body) = app
        .admin_request(Method::GET, "/api/v1/products/summary", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["counts"]["total_products"], 2);
    assert_eq!(body["counts"]["total_stock"], 6);
    assert_eq!(decimal_at(&body, "/counts/total_value"), dec!(140));
    assert_eq!(decimal_at(&body, "/valuation/total_value"), dec!(140));
}
