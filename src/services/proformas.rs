use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc};
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
use crate::entities::proforma::{self, BillInfo, ProformaStatus};
use crate::entities::{product, proforma_item};
use crate::errors::{map_unique_violation, ServiceError};
use crate::events::{Event, EventSender};
use crate::services::{stock, unwrap_txn_err};

pub const DEFAULT_PAYMENT_DAYS: i32 = 30;
pub const DEFAULT_LATE_FEE_PERCENTAGE: i32 = 5;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ProformaItemInput {
    pub product: Uuid,
    pub description: String,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TermsInput {
    pub payment_days: Option<i32>,
    pub late_fee_percentage: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProformaRequest {
    #[validate]
    pub bill_from: BillInfo,
    #[validate]
    pub bill_to: BillInfo,
    /// Issue date; defaults to now.
    pub date: Option<DateTime<Utc>>,
    pub terms: Option<TermsInput>,
    pub items: Vec<ProformaItemInput>,
    pub sales_tax: Option<Decimal>,
    pub other: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct InvoiceDetailsPatch {
    pub invoice_no: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateProformaRequest {
    /// Rejected when present: the invoice number is immutable.
    pub invoice_number: Option<String>,
    pub invoice_details: Option<InvoiceDetailsPatch>,
    pub bill_from: Option<BillInfo>,
    pub bill_to: Option<BillInfo>,
    pub date: Option<DateTime<Utc>>,
    pub terms: Option<TermsInput>,
    /// Replaces the full item list: old reservations are restored, then the
    /// new list is validated and reserved.
    pub items: Option<Vec<ProformaItemInput>>,
    pub sales_tax: Option<Decimal>,
    pub other: Option<Decimal>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ProformaWithItems {
    #[serde(flatten)]
    pub proforma: proforma::Model,
    pub items: Vec<proforma_item::Model>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProformaListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

#[derive(Debug, Serialize)]
pub struct ProformaListResponse {
    pub data: Vec<ProformaWithItems>,
    pub pagination: PaginationMeta,
}

/// `INV{year}{month}-{8 uppercase hex chars}`, unique per invoice.
fn generate_invoice_number(now: DateTime<Utc>) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!(
        "INV{}{:02}-{}",
        now.year(),
        now.month(),
        id[..8].to_uppercase()
    )
}

fn validate_items(items: &[ProformaItemInput]) -> Result<(), ServiceError> {
    for item in items {
        if item.quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Item quantity must be at least 1".to_string(),
            ));
        }
        if item.price.is_sign_negative() {
            return Err(ServiceError::ValidationError(
                "Item price cannot be negative".to_string(),
            ));
        }
    }
    Ok(())
}

/// Coordinates proforma invoices. Every line item's quantity stays reserved
/// against product stock while the invoice exists: reserved on create,
/// restore-then-reapply on item updates, released on (draft-only) delete.
#[derive(Clone)]
pub struct ProformaService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl ProformaService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        request: CreateProformaRequest,
    ) -> Result<ProformaWithItems, ServiceError> {
        request.validate()?;
        validate_items(&request.items)?;

        let now = Utc::now();
        let invoice_number = generate_invoice_number(now);
        let issue_date = request.date.unwrap_or(now);
        let terms = request.terms.clone().unwrap_or_default();
        let payment_days = terms.payment_days.unwrap_or(DEFAULT_PAYMENT_DAYS);
        let late_fee = terms
            .late_fee_percentage
            .unwrap_or_else(|| Decimal::from(DEFAULT_LATE_FEE_PERCENTAGE));
        let due_date = issue_date + Duration::days(i64::from(payment_days));
        let sales_tax = request.sales_tax.unwrap_or(Decimal::ZERO);
        let other = request.other.unwrap_or(Decimal::ZERO);

        let created = self
            .db
            .transaction::<_, ProformaWithItems, ServiceError>(move |txn| {
                Box::pin(async move {
                    let proforma_id = Uuid::new_v4();
                    let mut subtotal = Decimal::ZERO;
                    let mut item_rows = Vec::with_capacity(request.items.len());

                    for item in &request.items {
                        product::Entity::find_by_id(item.product)
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!("Product {} not found", item.product))
                            })?;

                        stock::reserve(txn, item.product, item.quantity).await?;

                        let total = item.price * Decimal::from(item.quantity);
                        subtotal += total;
                        item_rows.push(proforma_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            proforma_id: Set(proforma_id),
                            product_id: Set(item.product),
                            description: Set(item.description.clone()),
                            quantity: Set(item.quantity),
                            price: Set(item.price),
                            total: Set(total),
                        });
                    }

                    let header = proforma::ActiveModel {
                        id: Set(proforma_id),
                        invoice_number: Set(invoice_number.clone()),
                        bill_from: Set(request.bill_from.clone()),
                        bill_to: Set(request.bill_to.clone()),
                        date: Set(issue_date),
                        due_date: Set(due_date),
                        payment_days: Set(payment_days),
                        late_fee_percentage: Set(late_fee),
                        subtotal: Set(subtotal),
                        sales_tax: Set(sales_tax),
                        other: Set(other),
                        total: Set(subtotal + sales_tax + other),
                        status: Set(ProformaStatus::Draft.to_string()),
                        created_at: Set(now),
                        updated_at: Set(Some(now)),
                    }
                    .insert(txn)
                    .await
                    .map_err(|e| map_unique_violation(e, "Invoice number"))?;

                    let mut items = Vec::with_capacity(item_rows.len());
                    for row in item_rows {
                        items.push(row.insert(txn).await.map_err(ServiceError::db_error)?);
                    }

                    Ok(ProformaWithItems {
                        proforma: header,
                        items,
                    })
                })
            })
            .await
            .map_err(unwrap_txn_err)?;

        info!(
            proforma_id = %created.proforma.id,
            invoice_number = %created.proforma.invoice_number,
            "proforma created"
        );
        if let Err(err) = self
            .event_sender
            .send(Event::ProformaIssued {
                proforma_id: created.proforma.id,
                invoice_number: created.proforma.invoice_number.clone(),
            })
            .await
        {
            warn!(error = %err, "failed to send proforma event");
        }

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<ProformaWithItems, ServiceError> {
        let header = proforma::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Proforma not found".to_string()))?;

        let items = proforma_item::Entity::find()
            .filter(proforma_item::Column::ProformaId.eq(id))
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        Ok(ProformaWithItems {
            proforma: header,
            items,
        })
    }

    #[instrument(skip(self))]
    pub async fn list(&self, query: ProformaListQuery) -> Result<ProformaListResponse, ServiceError> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.limit.unwrap_or(10).clamp(1, 100);

        let mut condition = Condition::all();
        if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
            condition = condition.add(proforma::Column::Status.eq(status));
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            condition = condition.add(proforma::Column::InvoiceNumber.contains(search));
        }
        if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
            condition = condition
                .add(proforma::Column::Date.gte(start))
                .add(proforma::Column::Date.lte(end));
        }

        let paginator = proforma::Entity::find()
            .filter(condition)
            .order_by_desc(proforma::Column::CreatedAt)
            .paginate(self.db.as_ref(), per_page);
        let total_items = paginator
            .num_items()
            .await
            .map_err(ServiceError::db_error)?;
        let headers = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        let ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();
        let mut items_by_proforma: HashMap<Uuid, Vec<proforma_item::Model>> = HashMap::new();
        if !ids.is_empty() {
            let items = proforma_item::Entity::find()
                .filter(proforma_item::Column::ProformaId.is_in(ids))
                .all(self.db.as_ref())
                .await
                .map_err(ServiceError::db_error)?;
            for item in items {
                items_by_proforma
                    .entry(item.proforma_id)
                    .or_default()
                    .push(item);
            }
        }

        let data = headers
            .into_iter()
            .map(|header| {
                let items = items_by_proforma.remove(&header.id).unwrap_or_default();
                ProformaWithItems {
                    proforma: header,
                    items,
                }
            })
            .collect();

        let total_pages = total_items.div_ceil(per_page);
        Ok(ProformaListResponse {
            data,
            pagination: PaginationMeta {
                current_page: page,
                total_pages,
                total_items,
                has_next_page: page < total_pages,
                has_prev_page: page > 1,
            },
        })
    }

    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: Uuid,
        request: UpdateStatusRequest,
    ) -> Result<proforma::Model, ServiceError> {
        let status: ProformaStatus = request.status.parse().map_err(|_| {
            ServiceError::ValidationError(format!("Unknown status '{}'", request.status))
        })?;

        let header = proforma::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound("Proforma not found".to_string()))?;

        let mut active: proforma::ActiveModel = header.into();
        active.status = Set(status.to_string());
        active.updated_at = Set(Some(Utc::now()));
        active
            .update(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Updates an invoice. When `items` are supplied the stored reservations
    /// are restored first, then the new list is validated and re-reserved, so
    /// a no-op update nets a zero stock delta and a failed update leaves the
    /// original reservations untouched.
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateProformaRequest,
    ) -> Result<ProformaWithItems, ServiceError> {
        if request.invoice_number.is_some()
            || request
                .invoice_details
                .as_ref()
                .and_then(|d| d.invoice_no.as_ref())
                .is_some()
        {
            return Err(ServiceError::ImmutableField(
                "Invoice number cannot be modified".to_string(),
            ));
        }
        if let Some(items) = &request.items {
            validate_items(items)?;
        }
        if let Some(status) = &request.status {
            status.parse::<ProformaStatus>().map_err(|_| {
                ServiceError::ValidationError(format!("Unknown status '{status}'"))
            })?;
        }

        let updated = self
            .db
            .transaction::<_, ProformaWithItems, ServiceError>(move |txn| {
                Box::pin(async move {
                    let header = proforma::Entity::find_by_id(id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| ServiceError::NotFound("Proforma not found".to_string()))?;

                    let mut subtotal = header.subtotal;
                    let mut new_items: Option<Vec<proforma_item::Model>> = None;

                    if let Some(items) = &request.items {
                        // Restore the stock held by the stored line items. A
                        // referenced product may have been deleted since; that
                        // reservation is simply gone.
                        let stored = proforma_item::Entity::find()
                            .filter(proforma_item::Column::ProformaId.eq(id))
                            .all(txn)
                            .await
                            .map_err(ServiceError::db_error)?;
                        for item in &stored {
                            match stock::release(txn, item.product_id, item.quantity).await {
                                Ok(_) => {}
                                Err(ServiceError::NotFound(_)) => continue,
                                Err(err) => return Err(err),
                            }
                        }
                        proforma_item::Entity::delete_many()
                            .filter(proforma_item::Column::ProformaId.eq(id))
                            .exec(txn)
                            .await
                            .map_err(ServiceError::db_error)?;

                        subtotal = Decimal::ZERO;
                        let mut inserted = Vec::with_capacity(items.len());
                        for item in items {
                            product::Entity::find_by_id(item.product)
                                .one(txn)
                                .await
                                .map_err(ServiceError::db_error)?
                                .ok_or_else(|| {
                                    ServiceError::NotFound(format!(
                                        "Product {} not found",
                                        item.product
                                    ))
                                })?;

                            stock::reserve(txn, item.product, item.quantity).await?;

                            let total = item.price * Decimal::from(item.quantity);
                            subtotal += total;
                            let row = proforma_item::ActiveModel {
                                id: Set(Uuid::new_v4()),
                                proforma_id: Set(id),
                                product_id: Set(item.product),
                                description: Set(item.description.clone()),
                                quantity: Set(item.quantity),
                                price: Set(item.price),
                                total: Set(total),
                            }
                            .insert(txn)
                            .await
                            .map_err(ServiceError::db_error)?;
                            inserted.push(row);
                        }
                        new_items = Some(inserted);
                    }

                    let issue_date = request.date.unwrap_or(header.date);
                    let payment_days = request
                        .terms
                        .as_ref()
                        .and_then(|t| t.payment_days)
                        .unwrap_or(header.payment_days);
                    let late_fee = request
                        .terms
                        .as_ref()
                        .and_then(|t| t.late_fee_percentage)
                        .unwrap_or(header.late_fee_percentage);
                    let sales_tax = request.sales_tax.unwrap_or(header.sales_tax);
                    let other = request.other.unwrap_or(header.other);

                    let mut active: proforma::ActiveModel = header.into();
                    if let Some(bill_from) = request.bill_from.clone() {
                        active.bill_from = Set(bill_from);
                    }
                    if let Some(bill_to) = request.bill_to.clone() {
                        active.bill_to = Set(bill_to);
                    }
                    if let Some(status) = &request.status {
                        active.status = Set(status.clone());
                    }
                    active.date = Set(issue_date);
                    active.payment_days = Set(payment_days);
                    active.late_fee_percentage = Set(late_fee);
                    active.due_date = Set(issue_date + Duration::days(i64::from(payment_days)));
                    active.subtotal = Set(subtotal);
                    active.sales_tax = Set(sales_tax);
                    active.other = Set(other);
                    active.total = Set(subtotal + sales_tax + other);
                    active.updated_at = Set(Some(Utc::now()));

                    let header = active.update(txn).await.map_err(ServiceError::db_error)?;

                    let items = match new_items {
                        Some(items) => items,
                        None => proforma_item::Entity::find()
                            .filter(proforma_item::Column::ProformaId.eq(id))
                            .all(txn)
                            .await
                            .map_err(ServiceError::db_error)?,
                    };

                    Ok(ProformaWithItems {
                        proforma: header,
                        items,
                    })
                })
            })
            .await
            .map_err(unwrap_txn_err)?;

        info!(proforma_id = %updated.proforma.id, "proforma updated");
        Ok(updated)
    }

    /// Deletes a draft invoice, restoring the stock held by its line items.
    /// Any other status is a precondition failure and leaves stock untouched.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.db
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    let header = proforma::Entity::find_by_id(id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| ServiceError::NotFound("Proforma not found".to_string()))?;

                    if !header.is_draft() {
                        return Err(ServiceError::PreconditionFailed(
                            "Only draft proformas can be deleted".to_string(),
                        ));
                    }

                    let items = proforma_item::Entity::find()
                        .filter(proforma_item::Column::ProformaId.eq(id))
                        .all(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    for item in &items {
                        match stock::release(txn, item.product_id, item.quantity).await {
                            Ok(_) => {}
                            Err(ServiceError::NotFound(_)) => continue,
                            Err(err) => return Err(err),
                        }
                    }

                    proforma_item::Entity::delete_many()
                        .filter(proforma_item::Column::ProformaId.eq(id))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    proforma::Entity::delete_by_id(id)
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    Ok(())
                })
            })
            .await
            .map_err(unwrap_txn_err)?;

        info!(proforma_id = %id, "proforma deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn invoice_number_carries_year_month_and_suffix() {
        let date = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        let number = generate_invoice_number(date);

        assert!(number.starts_with("INV202403-"));
        let suffix = number.strip_prefix("INV202403-").unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn invoice_numbers_are_distinct() {
        let date = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        assert_ne!(generate_invoice_number(date), generate_invoice_number(date));
    }

    #[test]
    fn item_validation_catches_bad_rows() {
        let bad_quantity = vec![ProformaItemInput {
            product: Uuid::new_v4(),
            description: "x".into(),
            quantity: 0,
            price: dec!(1),
        }];
        assert!(matches!(
            validate_items(&bad_quantity),
            Err(ServiceError::ValidationError(_))
        ));

        let bad_price = vec![ProformaItemInput {
            product: Uuid::new_v4(),
            description: "x".into(),
            quantity: 1,
            price: dec!(-1),
        }];
        assert!(matches!(
            validate_items(&bad_price),
            Err(ServiceError::ValidationError(_))
        ));

        assert!(validate_items(&[]).is_ok());
    }
}
