use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter as StrumEnumIter, EnumString};
use uuid::Uuid;

/// Image URLs attached to a product, stored as a JSON array (1 to 5 entries).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct ImageList(pub Vec<String>);

/// Measurement dimension a product is sold in. Each type fixes the set of
/// units it accepts; `Size` entries carry no numeric value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, StrumEnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MeasurementType {
    Weight,
    Length,
    Volume,
    Size,
    Pieces,
}

impl MeasurementType {
    pub fn allowed_units(&self) -> &'static [&'static str] {
        match self {
            Self::Weight => &["g", "kg", "lb"],
            Self::Length => &["cm", "m", "inch"],
            Self::Volume => &["ml", "l", "oz"],
            Self::Pieces => &["pc", "dozen", "set"],
            Self::Size => &[
                "EXTRA_SMALL",
                "SMALL",
                "MEDIUM",
                "LARGE",
                "EXTRA_LARGE",
                "XXL",
                "XXXL",
                "EU_36",
                "EU_37",
                "EU_38",
                "EU_39",
                "EU_40",
                "EU_41",
                "EU_42",
                "EU_43",
                "EU_44",
                "EU_45",
                "EU_46",
                "EU_47",
            ],
        }
    }

    /// A numeric value accompanies every measurement except sizes.
    pub fn requires_value(&self) -> bool {
        !matches!(self, Self::Size)
    }
}

/// Product entity. `stock` is the single source of truth for availability
/// and is only ever mutated through the stock ledger's conditional updates.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning account.
    pub user_id: Uuid,

    pub seller_id: Uuid,
    pub category_id: Uuid,
    pub brand_id: Option<Uuid>,

    pub name: String,
    pub description: Option<String>,

    /// Unit price; never negative.
    pub price: Decimal,

    /// On-hand quantity; never negative.
    pub stock: i32,

    /// One of weight | length | volume | size | pieces, when measured.
    pub measurement_type: Option<String>,
    pub measurement_unit: Option<String>,
    pub measurement_value: Option<Decimal>,

    #[sea_orm(column_type = "Json")]
    pub images: ImageList,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::seller::Entity",
        from = "Column::SellerId",
        to = "super::seller::Column::Id"
    )]
    Seller,
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::brand::Entity",
        from = "Column::BrandId",
        to = "super::brand::Column::Id"
    )]
    Brand,
    #[sea_orm(has_many = "super::sale::Entity")]
    Sales,
    #[sea_orm(has_many = "super::purchase::Entity")]
    Purchases,
    #[sea_orm(has_many = "super::proforma_item::Entity")]
    ProformaItems,
}

impl Related<super::seller::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Seller.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::brand::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Brand.def()
    }
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl Related<super::purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchases.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        use sea_orm::ActiveValue;

        let mut active_model = self;

        if insert && matches!(active_model.created_at, ActiveValue::NotSet) {
            active_model.created_at = ActiveValue::Set(Utc::now());
        }
        active_model.updated_at = ActiveValue::Set(Some(Utc::now()));

        if let ActiveValue::Set(price) = &active_model.price {
            if price.is_sign_negative() {
                return Err(DbErr::Custom("Price cannot be negative".to_string()));
            }
        }
        if let ActiveValue::Set(stock) = &active_model.stock {
            if *stock < 0 {
                return Err(DbErr::Custom("Stock cannot be negative".to_string()));
            }
        }

        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_sets_match_measurement_types() {
        assert!(MeasurementType::Weight.allowed_units().contains(&"kg"));
        assert!(MeasurementType::Volume.allowed_units().contains(&"oz"));
        assert!(!MeasurementType::Weight.allowed_units().contains(&"cm"));
        assert!(MeasurementType::Size.allowed_units().contains(&"EU_42"));
    }

    #[test]
    fn size_measurements_carry_no_value() {
        assert!(!MeasurementType::Size.requires_value());
        assert!(MeasurementType::Pieces.requires_value());
    }

    #[test]
    fn measurement_type_parses_lowercase() {
        assert_eq!(
            "weight".parse::<MeasurementType>().unwrap(),
            MeasurementType::Weight
        );
        assert!("carats".parse::<MeasurementType>().is_err());
    }
}
