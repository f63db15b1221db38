//! Expense/credit/debit ledgers: CRUD, by-status summaries and the overdue
//! sweep, plus the login flow that fronts them.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use serde_json::json;

use common::{decimal_at, TestApp};

#[tokio::test]
async fn login_issues_a_working_token() {
    let app = TestApp::new().await;

    // The seeded admin's email is derived from its id.
    let email = format!("admin-{}@example.com", app.admin_id.simple());
    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": email, "password": "correct horse" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, _) = app
        .request(Method::GET, "/api/v1/products", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": email, "password": "wrong horse" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
}

#[tokio::test]
async fn expenses_reject_negative_amounts_and_list_by_status() {
    let app = TestApp::new().await;

    let (status, body) = app
        .admin_request(
            Method::POST,
            "/api/v1/expenses",
            Some(json!({
                "title": "Rent",
                "amount": -10,
                "date": Utc::now(),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let (status, _) = app
        .admin_request(
            Method::POST,
            "/api/v1/expenses",
            Some(json!({ "title": "Rent", "amount": 300, "date": Utc::now() })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .admin_request(
            Method::POST,
            "/api/v1/expenses",
            Some(json!({
                "title": "Old insurance",
                "amount": 120,
                "date": Utc::now(),
                "status": "ARCHIVED",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // The default listing only shows ACTIVE rows.
    let (status, body) = app
        .admin_request(Method::GET, "/api/v1/expenses", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_expenses"], 1);
    assert_eq!(body["expenses"][0]["title"], "Rent");

    let (status, body) = app
        .admin_request(Method::GET, "/api/v1/expenses/summary", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let summary = body.as_array().unwrap();
    assert_eq!(summary.len(), 2);
    let active = summary.iter().find(|s| s["status"] == "ACTIVE").unwrap();
    assert_eq!(decimal_at(active, "/total_amount"), dec!(300));
}

#[tokio::test]
async fn credit_amounts_must_reconcile() {
    let app = TestApp::new().await;

    let payload = |down: i64, financed: i64| {
        json!({
            "product_ref": "SKU-11",
            "total_amount": 100,
            "down_payment": down,
            "credit_amount": financed,
            "customer_name": "Ama",
            "customer_phone": "+233200000000",
            "customer_email": "ama@example.com",
            "payment_due_date": Utc::now() + Duration::days(14),
        })
    };

    let (status, body) = app
        .admin_request(Method::POST, "/api/v1/credits", Some(payload(40, 50)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let (status, body) = app
        .admin_request(Method::POST, "/api/v1/credits", Some(payload(40, 60)))
        .await;
    assert_eq!(status, StatusCode::CREATED, "body: {body}");
    assert_eq!(body["status"], "PENDING");
}

#[tokio::test]
async fn debit_sweep_flags_overdue_rows_only() {
    let app = TestApp::new().await;

    let payload = |due: chrono::DateTime<Utc>| {
        json!({
            "product_ref": "SKU-42",
            "total_amount": 100,
            "down_payment": 20,
            "debit_amount": 80,
            "customer_name": "Kofi",
            "customer_phone": "+233200000001",
            "customer_email": "kofi@example.com",
            "payment_due_date": due,
        })
    };

    let (status, overdue) = app
        .admin_request(
            Method::POST,
            "/api/v1/debits",
            Some(payload(Utc::now() - Duration::days(3))),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, current) = app
        .admin_request(
            Method::POST,
            "/api/v1/debits",
            Some(payload(Utc::now() + Duration::days(3))),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .admin_request(Method::POST, "/api/v1/debits/overdue-sweep", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["swept"], 1);

    let (_, listing) = app
        .admin_request(Method::GET, "/api/v1/debits?status=OVERDUE", None)
        .await;
    assert_eq!(listing["total_count"], 1);
    assert_eq!(listing["data"][0]["id"], overdue["id"]);

    let (_, listing) = app
        .admin_request(Method::GET, "/api/v1/debits?status=PENDING", None)
        .await;
    assert_eq!(listing["total_count"], 1);
    assert_eq!(listing["data"][0]["id"], current["id"]);

    // Completion is terminal and survives later sweeps.
    let id = current["id"].as_str().unwrap();
    let (status, body) = app
        .admin_request(
            Method::POST,
            &format!("/api/v1/debits/{id}/complete"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "COMPLETED");

    let (_, body) = app
        .admin_request(Method::GET, "/api/v1/debits/summary", None)
        .await;
    let statuses: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["status"].as_str().unwrap())
        .collect();
    assert!(statuses.contains(&"OVERDUE"));
    assert!(statuses.contains(&"COMPLETED"));
}
