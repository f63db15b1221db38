//! Sellers, categories and brands: thin reference data behind the products.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{EntityTrait, QueryOrder, Set};
use serde::Deserialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{brand, category, seller};
use crate::errors::ServiceError;
use crate::services::crud::Repository;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSellerRequest {
    #[validate(length(min = 1, message = "Seller name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateNamedRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

#[derive(Clone)]
pub struct CatalogService {
    sellers: Repository<seller::Entity>,
    categories: Repository<category::Entity>,
    brands: Repository<brand::Entity>,
}

impl CatalogService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self {
            sellers: Repository::new(db.clone()),
            categories: Repository::new(db.clone()),
            brands: Repository::new(db),
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_seller(
        &self,
        request: CreateSellerRequest,
        user_id: Uuid,
    ) -> Result<seller::Model, ServiceError> {
        request.validate()?;
        self.sellers
            .insert(seller::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                name: Set(request.name),
                email: Set(request.email),
                phone: Set(request.phone),
                created_at: Set(Utc::now()),
            })
            .await
    }

    pub async fn get_seller(&self, id: Uuid) -> Result<seller::Model, ServiceError> {
        self.sellers.require(id, "Seller").await
    }

    pub async fn list_sellers(&self, page: u64, limit: u64) -> Result<(Vec<seller::Model>, u64), ServiceError> {
        self.sellers
            .paginate(
                seller::Entity::find().order_by_asc(seller::Column::Name),
                page,
                limit,
            )
            .await
    }

    /// ADMIN-gated at the route.
    pub async fn delete_seller(&self, id: Uuid) -> Result<(), ServiceError> {
        let deleted = self.sellers.delete_by_id(id).await?;
        if deleted == 0 {
            return Err(ServiceError::NotFound("Seller not found".to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_category(
        &self,
        request: CreateNamedRequest,
        user_id: Uuid,
    ) -> Result<category::Model, ServiceError> {
        request.validate()?;
        self.categories
            .insert(category::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                name: Set(request.name),
                created_at: Set(Utc::now()),
            })
            .await
    }

    pub async fn list_categories(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<category::Model>, u64), ServiceError> {
        self.categories
            .paginate(
                category::Entity::find().order_by_asc(category::Column::Name),
                page,
                limit,
            )
            .await
    }

    pub async fn delete_category(&self, id: Uuid) -> Result<(), ServiceError> {
        let deleted = self.categories.delete_by_id(id).await?;
        if deleted == 0 {
            return Err(ServiceError::NotFound("Category not found".to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_brand(
        &self,
        request: CreateNamedRequest,
        user_id: Uuid,
    ) -> Result<brand::Model, ServiceError> {
        request.validate()?;
        self.brands
            .insert(brand::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                name: Set(request.name),
                created_at: Set(Utc::now()),
            })
            .await
    }

    pub async fn list_brands(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<brand::Model>, u64), ServiceError> {
        self.brands
            .paginate(
                brand::Entity::find().order_by_asc(brand::Column::Name),
                page,
                limit,
            )
            .await
    }

    pub async fn delete_brand(&self, id: Uuid) -> Result<(), ServiceError> {
        let deleted = self.brands.delete_by_id(id).await?;
        if deleted == 0 {
            return Err(ServiceError::NotFound("Brand not found".to_string()));
        }
        Ok(())
    }
}
