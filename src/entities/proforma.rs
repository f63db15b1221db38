use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Billing party snapshot embedded in the invoice.
#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, Validate, ToSchema,
)]
pub struct BillInfo {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Company name is required"))]
    pub company_name: String,
    pub street_address: String,
    pub city_state_zip: String,
    pub phone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProformaStatus {
    Draft,
    Sent,
    Paid,
    Cancelled,
}

/// Proforma invoice header. Line items live in `proforma_items`; each item's
/// quantity is reserved against product stock for as long as the invoice
/// exists (released on delete, adjusted on update).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "proformas")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Auto-generated, unique, immutable after creation.
    #[sea_orm(unique)]
    pub invoice_number: String,

    #[sea_orm(column_type = "Json")]
    pub bill_from: BillInfo,
    #[sea_orm(column_type = "Json")]
    pub bill_to: BillInfo,

    /// Issue date.
    pub date: DateTime<Utc>,
    /// date + payment_days days.
    pub due_date: DateTime<Utc>,

    pub payment_days: i32,
    pub late_fee_percentage: Decimal,

    pub subtotal: Decimal,
    pub sales_tax: Decimal,
    pub other: Decimal,
    /// subtotal + sales_tax + other.
    pub total: Decimal,

    /// One of draft | sent | paid | cancelled.
    pub status: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::proforma_item::Entity")]
    Items,
}

impl Related<super::proforma_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn status(&self) -> Option<ProformaStatus> {
        self.status.parse().ok()
    }

    pub fn is_draft(&self) -> bool {
        self.status == ProformaStatus::Draft.to_string()
    }
}
