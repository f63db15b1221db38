pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use std::sync::Arc;

use axum::{routing::get, Router};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<db::DbPool>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::products::create_product,
        handlers::products::list_products,
        handlers::products::product_summary,
        handlers::products::get_product,
        handlers::products::update_product,
        handlers::products::add_to_stock,
        handlers::products::delete_product,
        handlers::sales::create_sale,
        handlers::sales::list_sales,
        handlers::sales::get_sale,
        handlers::sales::daily_rollup,
        handlers::sales::weekly_rollup,
        handlers::sales::monthly_rollup,
        handlers::sales::yearly_rollup,
        handlers::purchases::create_purchase,
        handlers::purchases::list_purchases,
        handlers::proformas::create_proforma,
        handlers::proformas::list_proformas,
        handlers::proformas::get_proforma,
        handlers::proformas::update_proforma,
        handlers::proformas::update_status,
        handlers::proformas::delete_proforma,
        handlers::ledgers::create_expense,
        handlers::ledgers::list_expenses,
        handlers::ledgers::update_expense,
        handlers::ledgers::delete_expense,
        handlers::ledgers::expense_summary,
        handlers::ledgers::create_credit,
        handlers::ledgers::list_credits,
        handlers::ledgers::update_credit,
        handlers::ledgers::delete_credit,
        handlers::ledgers::credit_summary,
        handlers::ledgers::create_debit,
        handlers::ledgers::list_debits,
        handlers::ledgers::complete_debit,
        handlers::ledgers::sweep_overdue_debits,
        handlers::ledgers::delete_debit,
        handlers::ledgers::debit_summary,
    ),
    components(schemas(
        errors::ErrorResponse,
        auth::LoginCredentials,
        auth::TokenResponse,
        entities::proforma::BillInfo,
        services::products::MeasurementInput,
        services::products::CreateProductRequest,
        services::products::UpdateProductRequest,
        services::products::AddStockRequest,
        services::products::ProductCountSummary,
        services::sales::CreateSaleRequest,
        services::purchases::CreatePurchaseRequest,
        services::proformas::ProformaItemInput,
        services::proformas::TermsInput,
        services::proformas::CreateProformaRequest,
        services::proformas::UpdateProformaRequest,
        services::proformas::UpdateStatusRequest,
        services::proformas::PaginationMeta,
        services::ledgers::CreateExpenseRequest,
        services::ledgers::UpdateExpenseRequest,
        services::ledgers::CreateCreditRequest,
        services::ledgers::UpdateCreditRequest,
        services::ledgers::CreateDebitRequest,
        services::ledgers::StatusSummary,
        services::revenue::PeriodSummary,
        services::revenue::SalesSummary,
        services::revenue::UnitValuation,
        services::revenue::StockValuation,
    )),
    tags(
        (name = "auth", description = "Authentication"),
        (name = "products", description = "Products and stock"),
        (name = "sales", description = "Sales and revenue rollups"),
        (name = "purchases", description = "Stock replenishment"),
        (name = "proforma", description = "Proforma invoices"),
        (name = "expenses", description = "Expense ledger"),
        (name = "credits", description = "Credit ledger"),
        (name = "debits", description = "Debit ledger"),
    )
)]
pub struct ApiDoc;

/// Builds the full application router.
pub fn api_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/auth", handlers::auth::auth_router())
        .nest("/products", handlers::products::products_router())
        .nest("/sales", handlers::sales::sales_router())
        .nest("/purchases", handlers::purchases::purchases_router())
        .nest("/proforma", handlers::proformas::proformas_router())
        .nest("/expenses", handlers::ledgers::expenses_router())
        .nest("/credits", handlers::ledgers::credits_router())
        .nest("/debits", handlers::ledgers::debits_router())
        .nest("/sellers", handlers::catalog::sellers_router())
        .nest("/categories", handlers::catalog::categories_router())
        .nest("/brands", handlers::catalog::brands_router());

    Router::new()
        .nest("/api/v1", api)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}
