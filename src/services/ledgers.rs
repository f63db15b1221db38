//! Expense, credit and debit ledgers: independent of stock, with by-status
//! summaries. All three compose the generic repository for their plumbing.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::credit::{self, CreditStatus};
use crate::entities::debit::{self, DebitStatus};
use crate::entities::expense::{self, ExpenseStatus};
use crate::errors::ServiceError;
use crate::services::crud::Repository;

/// One row of a by-status aggregate.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusSummary {
    pub status: String,
    pub count: u64,
    pub total_amount: Decimal,
}

fn fold_by_status<'a, I>(rows: I) -> Vec<StatusSummary>
where
    I: IntoIterator<Item = (&'a str, Decimal)>,
{
    let mut groups: BTreeMap<String, (u64, Decimal)> = BTreeMap::new();
    for (status, amount) in rows {
        let entry = groups.entry(status.to_string()).or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += amount;
    }
    groups
        .into_iter()
        .map(|(status, (count, total_amount))| StatusSummary {
            status,
            count,
            total_amount,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Expenses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateExpenseRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub amount: Decimal,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateExpenseRequest {
    pub title: Option<String>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExpenseListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExpenseListResponse {
    pub expenses: Vec<expense::Model>,
    pub total_expenses: u64,
    pub total_pages: u64,
    pub current_page: u64,
}

#[derive(Clone)]
pub struct ExpenseService {
    repo: Repository<expense::Entity>,
}

impl ExpenseService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self {
            repo: Repository::new(db),
        }
    }

    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn create(
        &self,
        request: CreateExpenseRequest,
        user_id: Uuid,
    ) -> Result<expense::Model, ServiceError> {
        request.validate()?;
        if request.amount.is_sign_negative() {
            return Err(ServiceError::ValidationError(
                "Amount cannot be negative".to_string(),
            ));
        }
        let status = parse_status::<ExpenseStatus>(request.status.as_deref())?
            .unwrap_or(ExpenseStatus::Active);

        let now = Utc::now();
        self.repo
            .insert(expense::ActiveModel {
                id: Set(Uuid::new_v4()),
                title: Set(request.title),
                amount: Set(request.amount),
                description: Set(request.description),
                date: Set(request.date),
                created_by: Set(user_id),
                status: Set(status.to_string()),
                created_at: Set(now),
                updated_at: Set(Some(now)),
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn list(&self, query: ExpenseListQuery) -> Result<ExpenseListResponse, ServiceError> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.limit.unwrap_or(10).clamp(1, 100);

        let status = query.status.unwrap_or_else(|| "ACTIVE".to_string());
        let mut condition = Condition::all().add(expense::Column::Status.eq(status));
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            condition = condition.add(expense::Column::Title.contains(search));
        }

        let select = expense::Entity::find()
            .filter(condition)
            .order_by_desc(expense::Column::Date);
        let (expenses, total_expenses) = self.repo.paginate(select, page, per_page).await?;

        Ok(ExpenseListResponse {
            expenses,
            total_expenses,
            total_pages: total_expenses.div_ceil(per_page),
            current_page: page,
        })
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateExpenseRequest,
    ) -> Result<expense::Model, ServiceError> {
        if let Some(amount) = request.amount {
            if amount.is_sign_negative() {
                return Err(ServiceError::ValidationError(
                    "Amount cannot be negative".to_string(),
                ));
            }
        }
        let status = parse_status::<ExpenseStatus>(request.status.as_deref())?;

        let existing = self.repo.require(id, "Expense").await?;
        let mut active: expense::ActiveModel = existing.into();
        if let Some(title) = request.title {
            active.title = Set(title);
        }
        if let Some(amount) = request.amount {
            active.amount = Set(amount);
        }
        if request.description.is_some() {
            active.description = Set(request.description);
        }
        if let Some(date) = request.date {
            active.date = Set(date);
        }
        if let Some(status) = status {
            active.status = Set(status.to_string());
        }
        active.updated_at = Set(Some(Utc::now()));

        self.repo.update(active).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let deleted = self.repo.delete_by_id(id).await?;
        if deleted == 0 {
            return Err(ServiceError::NotFound(format!(
                "Expense with ID {id} not found"
            )));
        }
        info!(expense_id = %id, "expense deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<Vec<StatusSummary>, ServiceError> {
        let rows = expense::Entity::find()
            .all(self.repo.db())
            .await
            .map_err(ServiceError::db_error)?;
        Ok(fold_by_status(
            rows.iter().map(|r| (r.status.as_str(), r.amount)),
        ))
    }
}

// ---------------------------------------------------------------------------
// Credits and debits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCreditRequest {
    #[validate(length(min = 1, message = "Product reference is required"))]
    pub product_ref: String,
    pub total_amount: Decimal,
    pub down_payment: Decimal,
    pub credit_amount: Decimal,
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,
    pub customer_phone: String,
    #[validate(email(message = "A valid customer email is required"))]
    pub customer_email: String,
    pub payment_due_date: DateTime<Utc>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateCreditRequest {
    pub total_amount: Option<Decimal>,
    pub down_payment: Option<Decimal>,
    pub credit_amount: Option<Decimal>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub payment_due_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LedgerListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct LedgerListResponse<T> {
    pub data: Vec<T>,
    pub total_count: u64,
}

fn amounts_are_consistent(
    total: Decimal,
    down_payment: Decimal,
    financed: Decimal,
) -> Result<(), ServiceError> {
    if total.is_sign_negative() || down_payment.is_sign_negative() || financed.is_sign_negative() {
        return Err(ServiceError::ValidationError(
            "Amounts cannot be negative".to_string(),
        ));
    }
    if down_payment + financed != total {
        return Err(ServiceError::ValidationError(
            "Down payment plus financed amount must equal the total".to_string(),
        ));
    }
    Ok(())
}

fn parse_status<S: std::str::FromStr>(status: Option<&str>) -> Result<Option<S>, ServiceError> {
    match status {
        None => Ok(None),
        Some(raw) => raw
            .parse::<S>()
            .map(Some)
            .map_err(|_| ServiceError::ValidationError(format!("Unknown status '{raw}'"))),
    }
}

#[derive(Clone)]
pub struct CreditService {
    repo: Repository<credit::Entity>,
}

impl CreditService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self {
            repo: Repository::new(db),
        }
    }

    #[instrument(skip(self, request))]
    pub async fn create(&self, request: CreateCreditRequest) -> Result<credit::Model, ServiceError> {
        request.validate()?;
        amounts_are_consistent(
            request.total_amount,
            request.down_payment,
            request.credit_amount,
        )?;
        let status = parse_status::<CreditStatus>(request.status.as_deref())?
            .unwrap_or(CreditStatus::Pending);

        let now = Utc::now();
        self.repo
            .insert(credit::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_ref: Set(request.product_ref),
                total_amount: Set(request.total_amount),
                down_payment: Set(request.down_payment),
                credit_amount: Set(request.credit_amount),
                customer_name: Set(request.customer_name),
                customer_phone: Set(request.customer_phone),
                customer_email: Set(request.customer_email),
                payment_due_date: Set(request.payment_due_date),
                status: Set(status.to_string()),
                created_at: Set(now),
                updated_at: Set(Some(now)),
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        query: LedgerListQuery,
    ) -> Result<LedgerListResponse<credit::Model>, ServiceError> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.limit.unwrap_or(10).clamp(1, 100);

        let mut condition = Condition::all();
        if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
            condition = condition.add(credit::Column::Status.eq(status));
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            condition = condition.add(
                Condition::any()
                    .add(credit::Column::CustomerName.contains(search))
                    .add(credit::Column::CustomerEmail.contains(search))
                    .add(credit::Column::ProductRef.contains(search)),
            );
        }
        if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
            condition = condition
                .add(credit::Column::PaymentDueDate.gte(start))
                .add(credit::Column::PaymentDueDate.lte(end));
        }

        let select = credit::Entity::find()
            .filter(condition)
            .order_by_desc(credit::Column::CreatedAt);
        let (data, total_count) = self.repo.paginate(select, page, per_page).await?;
        Ok(LedgerListResponse { data, total_count })
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateCreditRequest,
    ) -> Result<credit::Model, ServiceError> {
        let status = parse_status::<CreditStatus>(request.status.as_deref())?;
        let existing = self.repo.require(id, "Credit record").await?;

        let total = request.total_amount.unwrap_or(existing.total_amount);
        let down = request.down_payment.unwrap_or(existing.down_payment);
        let financed = request.credit_amount.unwrap_or(existing.credit_amount);
        amounts_are_consistent(total, down, financed)?;

        let mut active: credit::ActiveModel = existing.into();
        active.total_amount = Set(total);
        active.down_payment = Set(down);
        active.credit_amount = Set(financed);
        if let Some(name) = request.customer_name {
            active.customer_name = Set(name);
        }
        if let Some(phone) = request.customer_phone {
            active.customer_phone = Set(phone);
        }
        if let Some(email) = request.customer_email {
            active.customer_email = Set(email);
        }
        if let Some(due) = request.payment_due_date {
            active.payment_due_date = Set(due);
        }
        if let Some(status) = status {
            active.status = Set(status.to_string());
        }
        active.updated_at = Set(Some(Utc::now()));

        self.repo.update(active).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let deleted = self.repo.delete_by_id(id).await?;
        if deleted == 0 {
            return Err(ServiceError::NotFound("Credit record not found".to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<Vec<StatusSummary>, ServiceError> {
        let rows = credit::Entity::find()
            .all(self.repo.db())
            .await
            .map_err(ServiceError::db_error)?;
        Ok(fold_by_status(
            rows.iter().map(|r| (r.status.as_str(), r.credit_amount)),
        ))
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateDebitRequest {
    #[validate(length(min = 1, message = "Product reference is required"))]
    pub product_ref: String,
    pub total_amount: Decimal,
    pub down_payment: Decimal,
    pub debit_amount: Decimal,
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,
    pub customer_phone: String,
    #[validate(email(message = "A valid customer email is required"))]
    pub customer_email: String,
    pub payment_due_date: DateTime<Utc>,
    pub status: Option<String>,
}

#[derive(Clone)]
pub struct DebitService {
    repo: Repository<debit::Entity>,
}

impl DebitService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self {
            repo: Repository::new(db),
        }
    }

    #[instrument(skip(self, request))]
    pub async fn create(&self, request: CreateDebitRequest) -> Result<debit::Model, ServiceError> {
        request.validate()?;
        amounts_are_consistent(
            request.total_amount,
            request.down_payment,
            request.debit_amount,
        )?;
        let status = parse_status::<DebitStatus>(request.status.as_deref())?
            .unwrap_or(DebitStatus::Pending);

        let now = Utc::now();
        self.repo
            .insert(debit::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_ref: Set(request.product_ref),
                total_amount: Set(request.total_amount),
                down_payment: Set(request.down_payment),
                debit_amount: Set(request.debit_amount),
                customer_name: Set(request.customer_name),
                customer_phone: Set(request.customer_phone),
                customer_email: Set(request.customer_email),
                payment_due_date: Set(request.payment_due_date),
                status: Set(status.to_string()),
                created_at: Set(now),
                updated_at: Set(Some(now)),
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        query: LedgerListQuery,
    ) -> Result<LedgerListResponse<debit::Model>, ServiceError> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.limit.unwrap_or(10).clamp(1, 100);

        let mut condition = Condition::all();
        if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
            condition = condition.add(debit::Column::Status.eq(status));
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            condition = condition.add(
                Condition::any()
                    .add(debit::Column::CustomerName.contains(search))
                    .add(debit::Column::CustomerEmail.contains(search))
                    .add(debit::Column::ProductRef.contains(search)),
            );
        }
        if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
            condition = condition
                .add(debit::Column::PaymentDueDate.gte(start))
                .add(debit::Column::PaymentDueDate.lte(end));
        }

        let select = debit::Entity::find()
            .filter(condition)
            .order_by_desc(debit::Column::CreatedAt);
        let (data, total_count) = self.repo.paginate(select, page, per_page).await?;
        Ok(LedgerListResponse { data, total_count })
    }

    /// Marks the debit settled.
    #[instrument(skip(self))]
    pub async fn mark_completed(&self, id: Uuid) -> Result<debit::Model, ServiceError> {
        let existing = self.repo.require(id, "Debit record").await?;
        let mut active: debit::ActiveModel = existing.into();
        active.status = Set(DebitStatus::Completed.to_string());
        active.updated_at = Set(Some(Utc::now()));
        self.repo.update(active).await
    }

    /// Flips every PENDING debit past its due date to OVERDUE. Returns how
    /// many rows changed.
    #[instrument(skip(self))]
    pub async fn sweep_overdue(&self) -> Result<u64, ServiceError> {
        let result = debit::Entity::update_many()
            .col_expr(
                debit::Column::Status,
                Expr::value(DebitStatus::Overdue.to_string()),
            )
            .filter(debit::Column::Status.eq(DebitStatus::Pending.to_string()))
            .filter(debit::Column::PaymentDueDate.lt(Utc::now()))
            .exec(self.repo.db())
            .await
            .map_err(ServiceError::db_error)?;

        if result.rows_affected > 0 {
            info!(count = result.rows_affected, "debits marked overdue");
        }
        Ok(result.rows_affected)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let deleted = self.repo.delete_by_id(id).await?;
        if deleted == 0 {
            return Err(ServiceError::NotFound("Debit record not found".to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<Vec<StatusSummary>, ServiceError> {
        let rows = debit::Entity::find()
            .all(self.repo.db())
            .await
            .map_err(ServiceError::db_error)?;
        Ok(fold_by_status(
            rows.iter().map(|r| (r.status.as_str(), r.debit_amount)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn by_status_fold_groups_and_sums() {
        let rows = vec![
            ("PENDING", dec!(100)),
            ("PENDING", dec!(50)),
            ("COMPLETED", dec!(25)),
        ];
        let summary = fold_by_status(rows);

        assert_eq!(summary.len(), 2);
        let pending = summary.iter().find(|s| s.status == "PENDING").unwrap();
        assert_eq!(pending.count, 2);
        assert_eq!(pending.total_amount, dec!(150));
    }

    #[test]
    fn by_status_fold_of_nothing_is_empty() {
        assert!(fold_by_status(Vec::<(&str, Decimal)>::new()).is_empty());
    }

    #[test]
    fn amount_consistency_checks() {
        assert!(amounts_are_consistent(dec!(100), dec!(40), dec!(60)).is_ok());
        assert!(amounts_are_consistent(dec!(100), dec!(40), dec!(50)).is_err());
        assert!(amounts_are_consistent(dec!(-1), dec!(0), dec!(-1)).is_err());
    }

    #[test]
    fn status_parsing_rejects_unknown_values() {
        assert!(parse_status::<DebitStatus>(Some("OVERDUE")).unwrap().is_some());
        assert!(parse_status::<DebitStatus>(Some("bogus")).is_err());
        assert!(parse_status::<CreditStatus>(None).unwrap().is_none());
    }
}
