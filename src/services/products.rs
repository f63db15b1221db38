use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::product::{self, ImageList, MeasurementType};
use crate::entities::{purchase, seller};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::crud::Repository;
use crate::services::{stock, unwrap_txn_err};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct MeasurementInput {
    #[serde(rename = "type")]
    pub measurement_type: String,
    pub value: Option<Decimal>,
    pub unit: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    pub seller: Uuid,
    pub category: Uuid,
    pub brand: Option<Uuid>,
    #[validate(length(min = 1, max = 255, message = "Product name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,
    pub measurement: Option<MeasurementInput>,
    #[validate(length(min = 1, max = 5, message = "Product must have between 1 and 5 images"))]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub seller: Option<Uuid>,
    pub category: Option<Uuid>,
    pub brand: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub measurement: Option<MeasurementInput>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddStockRequest {
    pub seller: Uuid,
    #[validate(range(min = 1, message = "Stock quantity must be greater than 0"))]
    pub stock: i32,
    /// Per-call low-stock threshold override.
    pub min_stock_alert: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProductListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub name: Option<String>,
    pub category: Option<Uuid>,
    pub brand: Option<Uuid>,
    pub seller: Option<Uuid>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub data: Vec<product::Model>,
    pub total_count: u64,
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct ProductCountSummary {
    pub total_products: u64,
    pub total_stock: i64,
    pub total_value: Decimal,
}

/// Validates a measurement payload: the unit must belong to the declared
/// type's fixed set, and every type except `size` carries a numeric value.
pub(crate) fn validate_measurement(
    measurement: &MeasurementInput,
) -> Result<MeasurementType, ServiceError> {
    let mtype: MeasurementType = measurement.measurement_type.parse().map_err(|_| {
        ServiceError::InvalidMeasurement(format!(
            "Unknown measurement type '{}'",
            measurement.measurement_type
        ))
    })?;

    if !mtype.allowed_units().contains(&measurement.unit.as_str()) {
        return Err(ServiceError::InvalidMeasurement(format!(
            "Invalid unit '{}' for measurement type '{}'",
            measurement.unit, mtype
        )));
    }

    if mtype.requires_value() && measurement.value.is_none() {
        return Err(ServiceError::InvalidMeasurement(format!(
            "Measurement type '{mtype}' requires a value"
        )));
    }

    Ok(mtype)
}

#[derive(Clone)]
pub struct ProductService {
    db: Arc<DbPool>,
    repo: Repository<product::Entity>,
    sellers: Repository<seller::Entity>,
    event_sender: EventSender,
    low_stock_threshold: i32,
}

impl ProductService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, low_stock_threshold: i32) -> Self {
        Self {
            repo: Repository::new(db.clone()),
            sellers: Repository::new(db.clone()),
            db,
            event_sender,
            low_stock_threshold,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(
        &self,
        request: CreateProductRequest,
        user_id: Uuid,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;
        if request.price.is_sign_negative() {
            return Err(ServiceError::ValidationError(
                "Price cannot be negative".to_string(),
            ));
        }

        self.sellers.require(request.seller, "Seller").await?;

        let measurement = request
            .measurement
            .as_ref()
            .map(validate_measurement)
            .transpose()?;

        let now = Utc::now();
        let created = self
            .repo
            .insert(product::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                seller_id: Set(request.seller),
                category_id: Set(request.category),
                brand_id: Set(request.brand),
                name: Set(request.name.clone()),
                description: Set(request.description.clone()),
                price: Set(request.price),
                stock: Set(request.stock),
                measurement_type: Set(measurement.map(|m| m.to_string())),
                measurement_unit: Set(request.measurement.as_ref().map(|m| m.unit.clone())),
                measurement_value: Set(request.measurement.as_ref().and_then(|m| m.value)),
                images: Set(ImageList(request.images.clone())),
                created_at: Set(now),
                updated_at: Set(Some(now)),
            })
            .await?;

        info!(product_id = %created.id, "product created");
        self.send_event(Event::ProductCreated {
            product_id: created.id,
            name: created.name.clone(),
        })
        .await;
        stock::check_low_stock(&self.event_sender, &created, self.low_stock_threshold).await;

        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        let measurement = request
            .measurement
            .as_ref()
            .map(validate_measurement)
            .transpose()?;

        if let Some(price) = request.price {
            if price.is_sign_negative() {
                return Err(ServiceError::ValidationError(
                    "Price cannot be negative".to_string(),
                ));
            }
        }
        if let Some(images) = &request.images {
            if images.is_empty() || images.len() > 5 {
                return Err(ServiceError::ValidationError(
                    "Product must have between 1 and 5 images".to_string(),
                ));
            }
        }

        let existing = self.repo.require(id, "Product").await?;
        let mut active: product::ActiveModel = existing.into();

        if let Some(seller) = request.seller {
            self.sellers.require(seller, "Seller").await?;
            active.seller_id = Set(seller);
        }
        if let Some(category) = request.category {
            active.category_id = Set(category);
        }
        if request.brand.is_some() {
            active.brand_id = Set(request.brand);
        }
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if request.description.is_some() {
            active.description = Set(request.description);
        }
        if let Some(price) = request.price {
            active.price = Set(price);
        }
        if let Some(m) = &request.measurement {
            active.measurement_type = Set(measurement.map(|t| t.to_string()));
            active.measurement_unit = Set(Some(m.unit.clone()));
            active.measurement_value = Set(m.value);
        }
        if let Some(images) = request.images {
            active.images = Set(ImageList(images));
        }

        let updated = self.repo.update(active).await?;

        self.send_event(Event::ProductUpdated {
            product_id: updated.id,
            name: updated.name.clone(),
            detail: None,
        })
        .await;
        stock::check_low_stock(&self.event_sender, &updated, self.low_stock_threshold).await;

        Ok(updated)
    }

    /// Stock replenishment: increments the product's stock and records a
    /// mirroring purchase in one transaction. Notifications fire only after
    /// commit and never block the response.
    #[instrument(skip(self, request), fields(product_id = %id, quantity = request.stock))]
    pub async fn add_to_stock(
        &self,
        id: Uuid,
        request: AddStockRequest,
        user_id: Uuid,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;
        let quantity = request.stock;
        let min_stock_alert = request.min_stock_alert;

        let updated = self
            .db
            .transaction::<_, product::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let supplier = seller::Entity::find_by_id(request.seller)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| ServiceError::NotFound("Seller not found".to_string()))?;

                    let product = product::Entity::find_by_id(id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

                    let updated = stock::release(txn, product.id, request.stock).await?;

                    purchase::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        user_id: Set(user_id),
                        seller_id: Set(product.seller_id),
                        product_id: Set(product.id),
                        seller_name: Set(supplier.name.clone()),
                        product_name: Set(product.name.clone()),
                        quantity: Set(request.stock),
                        unit_price: Set(product.price),
                        total_price: Set(product.price * Decimal::from(request.stock)),
                        created_at: Set(Utc::now()),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    Ok(updated)
                })
            })
            .await
            .map_err(unwrap_txn_err)?;

        info!(product_id = %updated.id, stock = updated.stock, "stock replenished");
        self.send_event(Event::ProductUpdated {
            product_id: updated.id,
            name: updated.name.clone(),
            detail: Some(format!("Stock increased by {quantity} units")),
        })
        .await;
        stock::check_low_stock(
            &self.event_sender,
            &updated,
            min_stock_alert.unwrap_or(self.low_stock_threshold),
        )
        .await;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        let existing = self.repo.require(id, "Product").await?;
        self.repo.delete_by_id(id).await?;

        self.send_event(Event::ProductDeleted {
            product_id: existing.id,
            name: existing.name.clone(),
        })
        .await;

        Ok(existing)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid, user_id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(id)
            .filter(product::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn list(&self, query: ProductListQuery) -> Result<ProductListResponse, ServiceError> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.limit.unwrap_or(10).clamp(1, 100);

        let mut condition = Condition::all();
        if let Some(name) = query.name.as_deref().filter(|s| !s.is_empty()) {
            condition = condition.add(
                Condition::any()
                    .add(product::Column::Name.contains(name))
                    .add(product::Column::Description.contains(name)),
            );
        }
        if let Some(category) = query.category {
            condition = condition.add(product::Column::CategoryId.eq(category));
        }
        if let Some(brand) = query.brand {
            condition = condition.add(product::Column::BrandId.eq(brand));
        }
        if let Some(seller) = query.seller {
            condition = condition.add(product::Column::SellerId.eq(seller));
        }
        if let Some(min_price) = query.min_price {
            condition = condition.add(product::Column::Price.gte(min_price));
        }
        if let Some(max_price) = query.max_price {
            condition = condition.add(product::Column::Price.lte(max_price));
        }

        let ascending = query.sort_order.as_deref() == Some("asc");
        let sort_column = match query.sort_by.as_deref() {
            Some("name") => product::Column::Name,
            Some("price") => product::Column::Price,
            Some("stock") => product::Column::Stock,
            _ => product::Column::CreatedAt,
        };
        let select = if ascending {
            product::Entity::find()
                .filter(condition)
                .order_by_asc(sort_column)
        } else {
            product::Entity::find()
                .filter(condition)
                .order_by_desc(sort_column)
        };

        let (data, total_count) = self.repo.paginate(select, page, per_page).await?;
        Ok(ProductListResponse { data, total_count })
    }

    /// Counts products with their aggregate stock and value, optionally
    /// scoped to one user. Zero-valued when nothing matches.
    #[instrument(skip(self))]
    pub async fn count_total(
        &self,
        user_id: Option<Uuid>,
    ) -> Result<ProductCountSummary, ServiceError> {
        let mut query = product::Entity::find();
        if let Some(user_id) = user_id {
            query = query.filter(product::Column::UserId.eq(user_id));
        }
        let products = query
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        let mut summary = ProductCountSummary::default();
        for p in &products {
            summary.total_products += 1;
            summary.total_stock += i64::from(p.stock);
            summary.total_value += p.price * Decimal::from(p.stock);
        }
        Ok(summary)
    }

    async fn send_event(&self, event: Event) {
        if let Err(err) = self.event_sender.send(event).await {
            warn!(error = %err, "failed to send product event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn measurement(mtype: &str, unit: &str, value: Option<Decimal>) -> MeasurementInput {
        MeasurementInput {
            measurement_type: mtype.to_string(),
            value,
            unit: unit.to_string(),
        }
    }

    #[test]
    fn accepts_valid_measurements() {
        assert_eq!(
            validate_measurement(&measurement("weight", "kg", Some(dec!(1.5)))).unwrap(),
            MeasurementType::Weight
        );
        // Sizes carry no numeric value.
        assert_eq!(
            validate_measurement(&measurement("size", "EU_42", None)).unwrap(),
            MeasurementType::Size
        );
    }

    #[test]
    fn rejects_unit_outside_the_type_set() {
        let err = validate_measurement(&measurement("weight", "cm", Some(dec!(1)))).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidMeasurement(_)));
    }

    #[test]
    fn rejects_unknown_type() {
        let err = validate_measurement(&measurement("carats", "ct", Some(dec!(1)))).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidMeasurement(_)));
    }

    #[test]
    fn rejects_missing_value_for_valued_types() {
        let err = validate_measurement(&measurement("pieces", "pc", None)).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidMeasurement(_)));
    }
}
