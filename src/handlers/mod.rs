pub mod auth;
pub mod catalog;
pub mod ledgers;
pub mod products;
pub mod proformas;
pub mod purchases;
pub mod sales;

use std::sync::Arc;
use std::time::Duration;

use axum::{response::IntoResponse, Json};
use serde_json::json;

use crate::auth::{AuthConfig, AuthService};
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::catalog::CatalogService;
use crate::services::ledgers::{CreditService, DebitService, ExpenseService};
use crate::services::products::ProductService;
use crate::services::proformas::ProformaService;
use crate::services::purchases::PurchaseService;
use crate::services::revenue::RevenueService;
use crate::services::sales::SaleService;

/// Aggregates the services the HTTP handlers dispatch into.
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<ProductService>,
    pub sales: Arc<SaleService>,
    pub purchases: Arc<PurchaseService>,
    pub proformas: Arc<ProformaService>,
    pub revenue: Arc<RevenueService>,
    pub expenses: Arc<ExpenseService>,
    pub credits: Arc<CreditService>,
    pub debits: Arc<DebitService>,
    pub catalog: Arc<CatalogService>,
    pub auth: Arc<AuthService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, config: &AppConfig) -> Self {
        let revenue = Arc::new(RevenueService::new(db.clone()));
        let auth = Arc::new(AuthService::new(
            AuthConfig {
                jwt_secret: config.jwt_secret.clone(),
                token_ttl: Duration::from_secs(config.jwt_expiration),
            },
            db.clone(),
        ));

        Self {
            products: Arc::new(ProductService::new(
                db.clone(),
                event_sender.clone(),
                config.low_stock_threshold,
            )),
            sales: Arc::new(SaleService::new(
                db.clone(),
                event_sender.clone(),
                revenue.clone(),
                config.low_stock_threshold,
            )),
            purchases: Arc::new(PurchaseService::new(db.clone(), event_sender.clone())),
            proformas: Arc::new(ProformaService::new(db.clone(), event_sender)),
            revenue,
            expenses: Arc::new(ExpenseService::new(db.clone())),
            credits: Arc::new(CreditService::new(db.clone())),
            debits: Arc::new(DebitService::new(db.clone())),
            catalog: Arc::new(CatalogService::new(db)),
            auth,
        }
    }
}

/// Liveness probe.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
