//! Sale and purchase coordinator flows: stock boundaries, snapshots and
//! rollups, end to end over the HTTP surface.

mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;

use common::{decimal_at, TestApp};

#[tokio::test]
async fn sale_consumes_stock_down_to_zero_then_rejects() {
    let app = TestApp::new().await;
    let seller = app.seed_seller().await;
    let category = app.seed_category().await;
    let product = app.seed_product(seller, category, dec!(100), 10).await;

    // Selling the full stock succeeds and totals product_price * quantity.
    let (status, body) = app
        .admin_request(
            Method::POST,
            "/api/v1/sales",
            Some(json!({
                "product": product,
                "quantity": 10,
                "buyer_name": "Ama",
                "payment_mode": "cash",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "body: {body}");
    assert_eq!(decimal_at(&body, "/sale/total_price"), dec!(1000));
    assert_eq!(body["sale"]["quantity"], 10);
    assert_eq!(app.stock_of(product).await, 0);

    // One more unit is an overdraw: rejected, stock untouched.
    let (status, body) = app
        .admin_request(
            Method::POST,
            "/api/v1/sales",
            Some(json!({
                "product": product,
                "quantity": 1,
                "buyer_name": "Kofi",
                "payment_mode": "cash",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "insufficient_stock");
    assert_eq!(app.stock_of(product).await, 0);
}

#[tokio::test]
async fn oversized_sale_fails_and_leaves_stock_unchanged() {
    let app = TestApp::new().await;
    let seller = app.seed_seller().await;
    let category = app.seed_category().await;
    let product = app.seed_product(seller, category, dec!(50), 3).await;

    let (status, body) = app
        .admin_request(
            Method::POST,
            "/api/v1/sales",
            Some(json!({
                "product": product,
                "quantity": 4,
                "buyer_name": "Ama",
                "payment_mode": "momo",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "insufficient_stock");
    assert_eq!(app.stock_of(product).await, 3);
}

#[tokio::test]
async fn sale_snapshots_prices_against_later_product_edits() {
    let app = TestApp::new().await;
    let seller = app.seed_seller().await;
    let category = app.seed_category().await;
    let product = app.seed_product(seller, category, dec!(40), 10).await;

    let (status, body) = app
        .admin_request(
            Method::POST,
            "/api/v1/sales",
            Some(json!({
                "product": product,
                "quantity": 2,
                "selling_price": 55,
                "buyer_name": "Ama",
                "payment_mode": "transfer",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let sale_id = body["sale"]["id"].as_str().unwrap().to_string();

    // Later price edits must not rewrite the recorded sale.
    let (status, _) = app
        .admin_request(
            Method::PATCH,
            &format!("/api/v1/products/{product}"),
            Some(json!({ "price": 99 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .admin_request(Method::GET, &format!("/api/v1/sales/{sale_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal_at(&body, "/sale/product_price"), dec!(40));
    assert_eq!(decimal_at(&body, "/sale/selling_price"), dec!(55));
    assert_eq!(decimal_at(&body, "/sale/total_price"), dec!(80));
}

#[tokio::test]
async fn sale_against_missing_product_is_not_found() {
    let app = TestApp::new().await;

    let (status, body) = app
        .admin_request(
            Method::POST,
            "/api/v1/sales",
            Some(json!({
                "product": uuid::Uuid::new_v4(),
                "quantity": 1,
                "buyer_name": "Ama",
                "payment_mode": "cash",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn purchase_replenishes_empty_stock() {
    let app = TestApp::new().await;
    let seller = app.seed_seller().await;
    let category = app.seed_category().await;
    let product = app.seed_product(seller, category, dec!(100), 0).await;

    let (status, body) = app
        .admin_request(
            Method::POST,
            "/api/v1/purchases",
            Some(json!({
                "product": product,
                "seller": seller,
                "quantity": 5,
                "unit_price": 20,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "body: {body}");
    assert_eq!(decimal_at(&body, "/total_price"), dec!(100));
    assert_eq!(app.stock_of(product).await, 5);
}

#[tokio::test]
async fn empty_dataset_yields_zero_valued_summaries() {
    let app = TestApp::new().await;

    let (status, body) = app.admin_request(Method::GET, "/api/v1/sales", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 0);
    assert_eq!(body["summary"]["total_quantity_sold"], 0);
    assert_eq!(decimal_at(&body, "/summary/revenue"), dec!(0));
    assert_eq!(decimal_at(&body, "/summary/gross_profit"), dec!(0));

    for window in ["days", "weeks", "months", "years"] {
        let (status, body) = app
            .admin_request(Method::GET, &format!("/api/v1/sales/{window}"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["periods"], json!([]), "window {window}");
        assert_eq!(decimal_at(&body, "/total_revenue/total_value"), dec!(0));
    }
}

#[tokio::test]
async fn rollups_bucket_sales_with_profit_formula() {
    let app = TestApp::new().await;
    let seller = app.seed_seller().await;
    let category = app.seed_category().await;
    let product = app.seed_product(seller, category, dec!(10), 100).await;

    for _ in 0..2 {
        let (status, _) = app
            .admin_request(
                Method::POST,
                "/api/v1/sales",
                Some(json!({
                    "product": product,
                    "quantity": 3,
                    "selling_price": 15,
                    "buyer_name": "Ama",
                    "payment_mode": "cash",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .admin_request(Method::GET, "/api/v1/sales/days", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let periods = body["periods"].as_array().unwrap();
    assert_eq!(periods.len(), 1, "both sales land in today's bucket");
    assert_eq!(periods[0]["quantity_sold"], 6);
    assert_eq!(decimal_at(&periods[0], "/revenue"), dec!(90));
    assert_eq!(decimal_at(&periods[0], "/cost"), dec!(60));
    assert_eq!(decimal_at(&periods[0], "/gross_profit"), dec!(30));

    // Remaining stock of 94 units at price 10 values the inventory.
    assert_eq!(decimal_at(&body, "/total_revenue/total_value"), dec!(940));
}
