//! Generic repository shared by the thin CRUD services.
//!
//! Composed into each service rather than inherited: a service owns a
//! `Repository<E>` for the plumbing (find/insert/update/delete/paginate) and
//! keeps its domain logic in its own methods.

use std::marker::PhantomData;
use std::sync::Arc;

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, EntityTrait, FromQueryResult, IntoActiveModel,
    PaginatorTrait, PrimaryKeyTrait, Select,
};
use uuid::Uuid;

use crate::db::DbPool;
use crate::errors::ServiceError;

pub struct Repository<E: EntityTrait> {
    db: Arc<DbPool>,
    _entity: PhantomData<E>,
}

impl<E: EntityTrait> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> Repository<E>
where
    E: EntityTrait,
    E::Model: FromQueryResult + Send + Sync,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
{
    pub fn new(db: Arc<DbPool>) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    pub fn db(&self) -> &DbPool {
        self.db.as_ref()
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<E::Model>, ServiceError> {
        E::find_by_id::<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>(id.into())
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Like `find_by_id` but maps absence onto `NotFound` with a caller-chosen
    /// entity name.
    pub async fn require(&self, id: Uuid, what: &str) -> Result<E::Model, ServiceError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("{what} not found")))
    }

    pub async fn insert<A>(&self, model: A) -> Result<E::Model, ServiceError>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
        E::Model: IntoActiveModel<A>,
    {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    pub async fn update<A>(&self, model: A) -> Result<E::Model, ServiceError>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
        E::Model: IntoActiveModel<A>,
    {
        model
            .update(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Deletes one row, returning how many rows went away (0 or 1).
    pub async fn delete_by_id(&self, id: Uuid) -> Result<u64, ServiceError> {
        E::delete_by_id::<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>(id.into())
            .exec(self.db.as_ref())
            .await
            .map(|res| res.rows_affected)
            .map_err(ServiceError::db_error)
    }

    /// Runs a caller-built select through the paginator, returning the
    /// requested page plus the total number of matching rows. Pages are
    /// 1-based.
    pub async fn paginate(
        &self,
        query: Select<E>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<E::Model>, u64), ServiceError> {
        let paginator = query.paginate(self.db.as_ref(), per_page.max(1));
        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::db_error)?;
        let rows = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((rows, total))
    }
}
