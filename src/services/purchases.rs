use std::sync::Arc;

use chrono::Utc;
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
use crate::entities::{product, purchase, seller};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::{stock, unwrap_txn_err};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseRequest {
    pub product: Uuid,
    /// Supplier; defaults to the product's seller.
    pub seller: Option<Uuid>,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PurchaseListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PurchaseListResponse {
    pub data: Vec<purchase::Model>,
    pub total_count: u64,
    pub total_purchased_amount: Decimal,
}

/// Coordinates stock replenishment: the purchase record and the stock
/// increment are one atomic unit.
#[derive(Clone)]
pub struct PurchaseService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl PurchaseService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, request), fields(product_id = %request.product, quantity = request.quantity))]
    pub async fn create(
        &self,
        request: CreatePurchaseRequest,
        user_id: Uuid,
    ) -> Result<purchase::Model, ServiceError> {
        request.validate()?;
        if request.unit_price.is_sign_negative() {
            return Err(ServiceError::ValidationError(
                "Unit price cannot be negative".to_string(),
            ));
        }

        let created = self
            .db
            .transaction::<_, purchase::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let product = product::Entity::find_by_id(request.product)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

                    let seller_id = request.seller.unwrap_or(product.seller_id);
                    let supplier = seller::Entity::find_by_id(seller_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| ServiceError::NotFound("Seller not found".to_string()))?;

                    stock::release(txn, product.id, request.quantity).await?;

                    purchase::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        user_id: Set(user_id),
                        seller_id: Set(seller_id),
                        product_id: Set(product.id),
                        seller_name: Set(supplier.name.clone()),
                        product_name: Set(product.name.clone()),
                        quantity: Set(request.quantity),
                        unit_price: Set(request.unit_price),
                        total_price: Set(request.unit_price * Decimal::from(request.quantity)),
                        created_at: Set(Utc::now()),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(unwrap_txn_err)?;

        info!(purchase_id = %created.id, product_id = %created.product_id, "purchase created");

        if let Err(err) = self
            .event_sender
            .send(Event::PurchaseReceived {
                purchase_id: created.id,
                product_id: created.product_id,
                quantity: created.quantity,
            })
            .await
        {
            warn!(purchase_id = %created.id, error = %err, "failed to send purchase event");
        }

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list(&self, query: PurchaseListQuery) -> Result<PurchaseListResponse, ServiceError> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.limit.unwrap_or(10).clamp(1, 100);

        let mut condition = Condition::all();
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            condition = condition.add(
                Condition::any()
                    .add(purchase::Column::SellerName.contains(search))
                    .add(purchase::Column::ProductName.contains(search)),
            );
        }

        let paginator = purchase::Entity::find()
            .filter(condition)
            .order_by_desc(purchase::Column::CreatedAt)
            .paginate(self.db.as_ref(), per_page);
        let total_count = paginator
            .num_items()
            .await
            .map_err(ServiceError::db_error)?;
        let data = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        let total_purchased_amount = self.total_purchased_amount().await?;

        Ok(PurchaseListResponse {
            data,
            total_count,
            total_purchased_amount,
        })
    }

    /// Sum of all purchase totals; zero when no purchases exist.
    #[instrument(skip(self))]
    pub async fn total_purchased_amount(&self) -> Result<Decimal, ServiceError> {
        let purchases = purchase::Entity::find()
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        Ok(purchases.iter().map(|p| p.total_price).sum())
    }
}
