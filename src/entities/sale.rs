use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Cash,
    Momo,
    Cheque,
    Transfer,
}

/// Sale entity. Prices are snapshotted at transaction time so later product
/// price edits never rewrite historical records.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,
    pub product_id: Uuid,

    /// Product name at the time of sale.
    pub product_name: String,
    pub buyer_name: String,

    pub quantity: i32,

    /// Product list price at the time of sale (cost basis).
    pub product_price: Decimal,
    /// Actual unit price the buyer paid.
    pub selling_price: Decimal,
    /// product_price * quantity.
    pub total_price: Decimal,

    /// One of cash | momo | cheque | transfer.
    pub payment_mode: String,

    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
