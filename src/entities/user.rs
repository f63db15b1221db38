use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Account roles, in descending order of privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum Role {
    #[strum(serialize = "ADMIN")]
    #[serde(rename = "ADMIN")]
    Admin,
    #[strum(serialize = "KEEPER")]
    #[serde(rename = "KEEPER")]
    Keeper,
    #[strum(serialize = "USER")]
    #[serde(rename = "USER")]
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum UserStatus {
    #[strum(serialize = "PENDING")]
    #[serde(rename = "PENDING")]
    Pending,
    #[strum(serialize = "ACTIVE")]
    #[serde(rename = "ACTIVE")]
    Active,
    #[strum(serialize = "BLOCK")]
    #[serde(rename = "BLOCK")]
    Block,
}

/// Account entity. Passwords are stored as argon2 hashes only.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    #[sea_orm(unique)]
    pub email: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    /// One of ADMIN | KEEPER | USER.
    pub role: String,

    /// One of PENDING | ACTIVE | BLOCK.
    pub status: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active.to_string()
    }
}
