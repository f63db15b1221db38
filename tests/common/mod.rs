//! Shared harness: spins up the full router against a throwaway SQLite
//! database, with a seeded admin account and helpers for driving endpoints.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use stockroom_api::auth::hash_password;
use stockroom_api::config::AppConfig;
use stockroom_api::entities::user::{self, Role};
use stockroom_api::entities::{product, purchase};
use stockroom_api::events::{self, EventSender};
use stockroom_api::handlers::AppServices;
use stockroom_api::services::catalog::{CreateNamedRequest, CreateSellerRequest};
use stockroom_api::services::products::CreateProductRequest;
use stockroom_api::{db, AppState};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub admin_id: Uuid,
    pub admin_token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_file = std::env::temp_dir().join(format!(
            "stockroom_test_{}.db",
            Uuid::new_v4().simple()
        ));
        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_file.display()),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection(&cfg)
            .await
            .expect("failed to open test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations");
        let db = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        tokio::spawn(events::process_events(event_rx, None));

        let services = AppServices::new(db.clone(), event_sender.clone(), &cfg);

        let admin_id = Uuid::new_v4();
        user::ActiveModel {
            id: Set(admin_id),
            name: Set("Test Admin".to_string()),
            email: Set(format!("admin-{}@example.com", admin_id.simple())),
            password_hash: Set(hash_password("correct horse").unwrap()),
            role: Set("ADMIN".to_string()),
            status: Set("ACTIVE".to_string()),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(db.as_ref())
        .await
        .expect("failed to seed admin user");

        let admin_token = services
            .auth
            .issue_token(admin_id, Role::Admin)
            .expect("failed to issue admin token");

        let state = AppState {
            db,
            config: cfg,
            event_sender,
            services,
        };
        let router = stockroom_api::api_router(state.clone());

        Self {
            router,
            state,
            admin_id,
            admin_token,
        }
    }

    /// Issues a token for a fresh account with the given role.
    pub async fn token_for(&self, role: Role) -> String {
        let id = Uuid::new_v4();
        user::ActiveModel {
            id: Set(id),
            name: Set(format!("{role} user")),
            email: Set(format!("{}-{}@example.com", role, id.simple())),
            password_hash: Set(hash_password("correct horse").unwrap()),
            role: Set(role.to_string()),
            status: Set("ACTIVE".to_string()),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("failed to seed user");

        self.state
            .services
            .auth
            .issue_token(id, role)
            .expect("failed to issue token")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .expect("request failed");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn admin_request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let token = self.admin_token.clone();
        self.request(method, uri, body, Some(&token)).await
    }

    pub async fn seed_seller(&self) -> Uuid {
        self.state
            .services
            .catalog
            .create_seller(
                CreateSellerRequest {
                    name: "Acme Supplies".to_string(),
                    email: "acme@example.com".to_string(),
                    phone: None,
                },
                self.admin_id,
            )
            .await
            .expect("failed to seed seller")
            .id
    }

    pub async fn seed_category(&self) -> Uuid {
        self.state
            .services
            .catalog
            .create_category(
                CreateNamedRequest {
                    name: "General".to_string(),
                },
                self.admin_id,
            )
            .await
            .expect("failed to seed category")
            .id
    }

    pub async fn seed_product(
        &self,
        seller: Uuid,
        category: Uuid,
        price: Decimal,
        stock: i32,
    ) -> Uuid {
        self.state
            .services
            .products
            .create(
                CreateProductRequest {
                    seller,
                    category,
                    brand: None,
                    name: "Widget".to_string(),
                    description: None,
                    price,
                    stock,
                    measurement: None,
                    images: vec!["https://img.example.com/widget.jpg".to_string()],
                },
                self.admin_id,
            )
            .await
            .expect("failed to seed product")
            .id
    }

    pub async fn stock_of(&self, product_id: Uuid) -> i32 {
        product::Entity::find_by_id(product_id)
            .one(self.state.db.as_ref())
            .await
            .expect("failed to query product")
            .expect("product missing")
            .stock
    }

    pub async fn purchases_for(&self, product_id: Uuid) -> Vec<purchase::Model> {
        purchase::Entity::find()
            .filter(purchase::Column::ProductId.eq(product_id))
            .all(self.state.db.as_ref())
            .await
            .expect("failed to query purchases")
    }
}

/// Parses a Decimal out of a JSON field regardless of string/number encoding.
pub fn decimal_at(value: &Value, pointer: &str) -> Decimal {
    let field = value
        .pointer(pointer)
        .unwrap_or_else(|| panic!("missing field {pointer} in {value}"));
    serde_json::from_value(field.clone())
        .unwrap_or_else(|e| panic!("field {pointer} is not a decimal: {e}"))
}
