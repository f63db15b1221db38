use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::sale::{self, PaymentMode};
use crate::entities::product;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::revenue::{RevenueService, SalesSummary, StockValuation};
use crate::services::{stock, unwrap_txn_err};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSaleRequest {
    pub product: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    /// Unit price the buyer actually paid; defaults to the product price.
    pub selling_price: Option<Decimal>,
    #[validate(length(min = 1, message = "Buyer name is required"))]
    pub buyer_name: String,
    pub payment_mode: PaymentMode,
    /// Transaction date; defaults to now.
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct SaleCreated {
    pub sale: sale::Model,
    pub total_revenue: StockValuation,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SaleListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaleListResponse {
    pub data: Vec<sale::Model>,
    pub total_count: u64,
    pub summary: SalesSummary,
    pub total_revenue: StockValuation,
}

/// Coordinates the sale transaction: validate, snapshot prices, reserve
/// stock and persist the record as one atomic unit.
#[derive(Clone)]
pub struct SaleService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    revenue: Arc<RevenueService>,
    low_stock_threshold: i32,
}

impl SaleService {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: EventSender,
        revenue: Arc<RevenueService>,
        low_stock_threshold: i32,
    ) -> Self {
        Self {
            db,
            event_sender,
            revenue,
            low_stock_threshold,
        }
    }

    /// Creates a sale. Stock is decremented through the ledger's conditional
    /// update inside the same transaction as the insert, so a concurrent sale
    /// can never overdraw the product past zero.
    #[instrument(skip(self, request), fields(product_id = %request.product, quantity = request.quantity))]
    pub async fn create(
        &self,
        request: CreateSaleRequest,
        user_id: Uuid,
    ) -> Result<SaleCreated, ServiceError> {
        request.validate()?;

        let (sale, updated_product) = self
            .db
            .transaction::<_, (sale::Model, product::Model), ServiceError>(move |txn| {
                Box::pin(async move {
                    let product = product::Entity::find_by_id(request.product)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

                    let updated = stock::reserve(txn, product.id, request.quantity).await?;

                    // Snapshot prices so later product edits never rewrite
                    // this record.
                    let product_price = product.price;
                    let selling_price = request.selling_price.unwrap_or(product.price);
                    let total_price = product_price * Decimal::from(request.quantity);
                    let now = Utc::now();

                    let sale = sale::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        user_id: Set(user_id),
                        product_id: Set(product.id),
                        product_name: Set(product.name.clone()),
                        buyer_name: Set(request.buyer_name.clone()),
                        quantity: Set(request.quantity),
                        product_price: Set(product_price),
                        selling_price: Set(selling_price),
                        total_price: Set(total_price),
                        payment_mode: Set(request.payment_mode.to_string()),
                        date: Set(request.date.unwrap_or(now)),
                        created_at: Set(now),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    Ok((sale, updated))
                })
            })
            .await
            .map_err(unwrap_txn_err)?;

        info!(sale_id = %sale.id, product_id = %sale.product_id, "sale created");

        if let Err(err) = self
            .event_sender
            .send(Event::SaleCompleted {
                sale_id: sale.id,
                product_id: sale.product_id,
                quantity: sale.quantity,
            })
            .await
        {
            warn!(sale_id = %sale.id, error = %err, "failed to send sale event");
        }
        stock::check_low_stock(&self.event_sender, &updated_product, self.low_stock_threshold)
            .await;

        let total_revenue = self.revenue.stock_valuation(None).await?;
        Ok(SaleCreated {
            sale,
            total_revenue,
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<SaleCreated, ServiceError> {
        let sale = sale::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Sale not found".to_string()))?;

        let total_revenue = self.revenue.stock_valuation(None).await?;
        Ok(SaleCreated {
            sale,
            total_revenue,
        })
    }

    /// Lists sales newest-first with an all-time summary over every matching
    /// row (not just the returned page).
    #[instrument(skip(self))]
    pub async fn list(&self, query: SaleListQuery) -> Result<SaleListResponse, ServiceError> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.limit.unwrap_or(10).clamp(1, 100);

        let mut condition = Condition::all();
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            condition = condition.add(
                Condition::any()
                    .add(sale::Column::ProductName.contains(search))
                    .add(sale::Column::BuyerName.contains(search)),
            );
        }

        let matching = sale::Entity::find()
            .filter(condition.clone())
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        let summary = crate::services::revenue::summarize_sales(&matching);

        let paginator = sale::Entity::find()
            .filter(condition)
            .order_by_desc(sale::Column::CreatedAt)
            .paginate(self.db.as_ref(), per_page);
        let total_count = paginator
            .num_items()
            .await
            .map_err(ServiceError::db_error)?;
        let data = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        let total_revenue = self.revenue.stock_valuation(None).await?;

        Ok(SaleListResponse {
            data,
            total_count,
            summary,
            total_revenue,
        })
    }
}
