use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum CreditStatus {
    #[strum(serialize = "PENDING")]
    #[serde(rename = "PENDING")]
    Pending,
    #[strum(serialize = "COMPLETED")]
    #[serde(rename = "COMPLETED")]
    Completed,
    #[strum(serialize = "REJECTED")]
    #[serde(rename = "REJECTED")]
    Rejected,
}

/// Credit sale record: goods released against a partial down payment, the
/// balance due later. No stock coupling.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "credits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub product_ref: String,

    pub total_amount: Decimal,
    pub down_payment: Decimal,
    pub credit_amount: Decimal,

    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,

    pub payment_due_date: DateTime<Utc>,

    /// One of PENDING | COMPLETED | REJECTED.
    pub status: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
