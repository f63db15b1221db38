//! Stock ledger: the only code path that mutates `products.stock`.
//!
//! Both operations are single conditional updates scoped to one row, so the
//! "stock never negative" invariant holds under concurrent requests without
//! any application-level locking. Callers pass the enclosing transaction when
//! the mutation is part of a larger unit of work.

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::product;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Atomically decrements a product's stock, refusing to overdraw.
///
/// The decrement and the availability check are one statement
/// (`UPDATE ... SET stock = stock - qty WHERE id = ? AND stock >= qty`), so
/// two concurrent reservations can never jointly push stock below zero.
pub async fn reserve<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    quantity: i32,
) -> Result<product::Model, ServiceError> {
    if quantity <= 0 {
        return Err(ServiceError::ValidationError(
            "Quantity must be greater than 0".to_string(),
        ));
    }

    let result = product::Entity::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).sub(quantity),
        )
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::Stock.gte(quantity))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;

    if result.rows_affected == 0 {
        // The row was missing or the stock was short; probe to tell which.
        let existing = product::Entity::find_by_id(product_id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?;
        return Err(match existing {
            None => ServiceError::NotFound(format!("Product {product_id} not found")),
            Some(p) => ServiceError::InsufficientStock(format!(
                "{} of {} requested, {} in stock",
                quantity, p.name, p.stock
            )),
        });
    }

    let updated = product::Entity::find_by_id(product_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {product_id} not found")))?;

    info!(product_id = %product_id, quantity, stock = updated.stock, "stock reserved");
    Ok(updated)
}

/// Atomically increments a product's stock.
pub async fn release<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    quantity: i32,
) -> Result<product::Model, ServiceError> {
    if quantity <= 0 {
        return Err(ServiceError::ValidationError(
            "Quantity must be greater than 0".to_string(),
        ));
    }

    let result = product::Entity::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).add(quantity),
        )
        .filter(product::Column::Id.eq(product_id))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;

    if result.rows_affected == 0 {
        return Err(ServiceError::NotFound(format!(
            "Product {product_id} not found"
        )));
    }

    let updated = product::Entity::find_by_id(product_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {product_id} not found")))?;

    info!(product_id = %product_id, quantity, stock = updated.stock, "stock released");
    Ok(updated)
}

/// Emits a low-stock event when the product sits at or below the threshold.
/// Best-effort: a full event channel is logged and ignored.
pub async fn check_low_stock(sender: &EventSender, product: &product::Model, threshold: i32) {
    if product.stock > threshold {
        return;
    }

    let event = Event::LowStock {
        product_id: product.id,
        name: product.name.clone(),
        stock: product.stock,
        threshold,
    };
    if let Err(err) = sender.send(event).await {
        warn!(product_id = %product.id, error = %err, "failed to send low-stock event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DatabaseConnection;

    #[tokio::test]
    async fn reserve_rejects_non_positive_quantities() {
        let db = DatabaseConnection::Disconnected;
        let err = reserve(&db, Uuid::new_v4(), 0).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));

        let err = reserve(&db, Uuid::new_v4(), -3).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn release_rejects_non_positive_quantities() {
        let db = DatabaseConnection::Disconnected;
        let err = release(&db, Uuid::new_v4(), 0).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }
}
