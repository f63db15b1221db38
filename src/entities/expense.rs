use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum ExpenseStatus {
    #[strum(serialize = "ACTIVE")]
    #[serde(rename = "ACTIVE")]
    Active,
    #[strum(serialize = "ARCHIVED")]
    #[serde(rename = "ARCHIVED")]
    Archived,
}

/// Expense entity. Independent of stock; feeds net-profit rollups.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub title: String,
    pub amount: Decimal,
    pub description: Option<String>,
    pub date: DateTime<Utc>,

    pub created_by: Uuid,

    /// One of ACTIVE | ARCHIVED.
    pub status: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let sea_orm::ActiveValue::Set(amount) = &self.amount {
            if amount.is_sign_negative() {
                return Err(DbErr::Custom("Amount cannot be negative".to_string()));
            }
        }
        Ok(self)
    }
}
