//! Read-side revenue aggregation: period rollups, sale summaries and stock
//! valuation. Rows are fetched for the window and folded in-process so the
//! fold logic stays pure and directly testable.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{expense, product, sale};
use crate::errors::ServiceError;

/// Time bucket granularity for rollups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    Day,
    Week,
    Month,
    Year,
}

/// One rollup bucket. Only the key parts relevant to the window are present:
/// `(year, month, day)` for days, ISO `(year, week)` for weeks, and so on.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PeriodSummary {
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    pub quantity_sold: i64,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub gross_profit: Decimal,
    pub expenses: Decimal,
    pub net_profit: Decimal,
}

/// All-time summary over a set of sales. Zero-valued when the set is empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SalesSummary {
    pub total_quantity_sold: i64,
    pub total_sale_amount: Decimal,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub gross_profit: Decimal,
}

/// Stock valuation for one measurement-unit group.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnitValuation {
    pub unit: String,
    pub total_value: Decimal,
    pub total_stock: i64,
    pub average_price: Decimal,
}

/// Snapshot of what the on-hand inventory is worth.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct StockValuation {
    pub by_unit: Vec<UnitValuation>,
    pub total_value: Decimal,
    pub total_stock: i64,
}

/// A rollup response: chronological buckets plus the current valuation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RollupResponse {
    pub periods: Vec<PeriodSummary>,
    pub total_revenue: StockValuation,
}

type PeriodKey = (i32, u32, u32);

fn period_key(window: Window, date: DateTime<Utc>) -> PeriodKey {
    match window {
        Window::Day => (date.year(), date.month(), date.day()),
        Window::Week => {
            let iso = date.iso_week();
            (iso.year(), iso.week(), 0)
        }
        Window::Month => (date.year(), date.month(), 0),
        Window::Year => (date.year(), 0, 0),
    }
}

fn key_to_summary(window: Window, key: PeriodKey) -> PeriodSummary {
    let (year, a, b) = key;
    let (month, week, day) = match window {
        Window::Day => (Some(a), None, Some(b)),
        Window::Week => (None, Some(a), None),
        Window::Month => (Some(a), None, None),
        Window::Year => (None, None, None),
    };
    PeriodSummary {
        year,
        month,
        week,
        day,
        quantity_sold: 0,
        revenue: Decimal::ZERO,
        cost: Decimal::ZERO,
        gross_profit: Decimal::ZERO,
        expenses: Decimal::ZERO,
        net_profit: Decimal::ZERO,
    }
}

/// Folds sales and expenses into chronologically ascending buckets.
///
/// Canonical formulas (one version, applied everywhere):
///   revenue = sum(selling_price * quantity)
///   cost    = sum(product_price * quantity)
///   gross   = revenue - cost
///   net     = gross - expenses dated inside the same bucket
pub(crate) fn fold_rollup(
    window: Window,
    sales: &[sale::Model],
    expenses: &[expense::Model],
) -> Vec<PeriodSummary> {
    let mut buckets: BTreeMap<PeriodKey, PeriodSummary> = BTreeMap::new();

    for sale in sales {
        let key = period_key(window, sale.date);
        let entry = buckets
            .entry(key)
            .or_insert_with(|| key_to_summary(window, key));
        let qty = Decimal::from(sale.quantity);
        entry.quantity_sold += i64::from(sale.quantity);
        entry.revenue += sale.selling_price * qty;
        entry.cost += sale.product_price * qty;
    }

    for expense in expenses {
        let key = period_key(window, expense.date);
        // Expenses only land in buckets that saw sales; a bucket with nothing
        // but expenses is not a trading period.
        if let Some(entry) = buckets.get_mut(&key) {
            entry.expenses += expense.amount;
        }
    }

    buckets
        .into_values()
        .map(|mut summary| {
            summary.gross_profit = summary.revenue - summary.cost;
            summary.net_profit = summary.gross_profit - summary.expenses;
            summary
        })
        .collect()
}

/// Folds a set of sales into an all-time summary; zero-valued when empty.
pub(crate) fn summarize_sales(sales: &[sale::Model]) -> SalesSummary {
    let mut summary = SalesSummary::default();
    for sale in sales {
        let qty = Decimal::from(sale.quantity);
        summary.total_quantity_sold += i64::from(sale.quantity);
        summary.total_sale_amount += sale.total_price;
        summary.revenue += sale.selling_price * qty;
        summary.cost += sale.product_price * qty;
    }
    summary.gross_profit = summary.revenue - summary.cost;
    summary
}

/// Groups products by measurement unit and values the stock on hand.
pub(crate) fn fold_valuation(products: &[product::Model]) -> StockValuation {
    struct Acc {
        value: Decimal,
        stock: i64,
        price_sum: Decimal,
        count: u32,
    }

    let mut groups: BTreeMap<String, Acc> = BTreeMap::new();
    for p in products {
        let unit = p
            .measurement_unit
            .clone()
            .unwrap_or_else(|| "unspecified".to_string());
        let acc = groups.entry(unit).or_insert(Acc {
            value: Decimal::ZERO,
            stock: 0,
            price_sum: Decimal::ZERO,
            count: 0,
        });
        acc.value += p.price * Decimal::from(p.stock);
        acc.stock += i64::from(p.stock);
        acc.price_sum += p.price;
        acc.count += 1;
    }

    let mut valuation = StockValuation::default();
    for (unit, acc) in groups {
        valuation.total_value += acc.value;
        valuation.total_stock += acc.stock;
        valuation.by_unit.push(UnitValuation {
            unit,
            total_value: acc.value,
            total_stock: acc.stock,
            average_price: acc.price_sum / Decimal::from(acc.count),
        });
    }
    valuation
}

/// Read-side aggregation service.
#[derive(Clone)]
pub struct RevenueService {
    db: Arc<DbPool>,
}

impl RevenueService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Values the on-hand stock, optionally scoped to one owning user.
    #[instrument(skip(self))]
    pub async fn stock_valuation(
        &self,
        user_id: Option<Uuid>,
    ) -> Result<StockValuation, ServiceError> {
        let mut query = product::Entity::find();
        if let Some(user_id) = user_id {
            query = query.filter(product::Column::UserId.eq(user_id));
        }
        let products = query
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        Ok(fold_valuation(&products))
    }

    /// Builds the period rollup for one user at the given granularity.
    #[instrument(skip(self))]
    pub async fn rollup(
        &self,
        user_id: Uuid,
        window: Window,
    ) -> Result<RollupResponse, ServiceError> {
        let sales = sale::Entity::find()
            .filter(sale::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        let expenses = expense::Entity::find()
            .filter(expense::Column::CreatedBy.eq(user_id))
            .filter(expense::Column::Status.eq("ACTIVE"))
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        let periods = fold_rollup(window, &sales, &expenses);
        let total_revenue = self.stock_valuation(None).await?;

        Ok(RollupResponse {
            periods,
            total_revenue,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sale_on(date: DateTime<Utc>, qty: i32, product_price: Decimal, selling: Decimal) -> sale::Model {
        sale::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            product_name: "widget".into(),
            buyer_name: "buyer".into(),
            quantity: qty,
            product_price,
            selling_price: selling,
            total_price: product_price * Decimal::from(qty),
            payment_mode: "cash".into(),
            date,
            created_at: date,
        }
    }

    fn expense_on(date: DateTime<Utc>, amount: Decimal) -> expense::Model {
        expense::Model {
            id: Uuid::new_v4(),
            title: "rent".into(),
            amount,
            description: None,
            date,
            created_by: Uuid::new_v4(),
            status: "ACTIVE".into(),
            created_at: date,
            updated_at: None,
        }
    }

    fn product_with(unit: Option<&str>, price: Decimal, stock: i32) -> product::Model {
        product::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            brand_id: None,
            name: "widget".into(),
            description: None,
            price,
            stock,
            measurement_type: unit.map(|_| "size".into()),
            measurement_unit: unit.map(str::to_string),
            measurement_value: None,
            images: product::ImageList(vec!["a.jpg".into()]),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn empty_window_folds_to_no_buckets() {
        assert!(fold_rollup(Window::Day, &[], &[]).is_empty());
        let summary = summarize_sales(&[]);
        assert_eq!(summary.total_quantity_sold, 0);
        assert_eq!(summary.revenue, Decimal::ZERO);
        assert_eq!(summary.gross_profit, Decimal::ZERO);
    }

    #[test]
    fn daily_buckets_sort_ascending() {
        let jan_2 = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
        let jan_1 = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let sales = vec![
            sale_on(jan_2, 1, dec!(10), dec!(15)),
            sale_on(jan_1, 2, dec!(10), dec!(12)),
        ];

        let periods = fold_rollup(Window::Day, &sales, &[]);
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].day, Some(1));
        assert_eq!(periods[1].day, Some(2));
        assert_eq!(periods[0].quantity_sold, 2);
        assert_eq!(periods[0].revenue, dec!(24));
        assert_eq!(periods[0].cost, dec!(20));
        assert_eq!(periods[0].gross_profit, dec!(4));
    }

    #[test]
    fn weekly_buckets_use_iso_week() {
        // 2023-12-31 falls in ISO week 52 of 2023; 2024-01-01 in week 1 of 2024.
        let dec_31 = Utc.with_ymd_and_hms(2023, 12, 31, 12, 0, 0).unwrap();
        let jan_1 = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let sales = vec![
            sale_on(jan_1, 1, dec!(5), dec!(8)),
            sale_on(dec_31, 1, dec!(5), dec!(8)),
        ];

        let periods = fold_rollup(Window::Week, &sales, &[]);
        assert_eq!(periods.len(), 2);
        assert_eq!((periods[0].year, periods[0].week), (2023, Some(52)));
        assert_eq!((periods[1].year, periods[1].week), (2024, Some(1)));
    }

    #[test]
    fn net_profit_subtracts_same_bucket_expenses() {
        let day = Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();
        let other_day = Utc.with_ymd_and_hms(2024, 3, 6, 9, 0, 0).unwrap();
        let sales = vec![sale_on(day, 3, dec!(10), dec!(20))];
        let expenses = vec![expense_on(day, dec!(7)), expense_on(other_day, dec!(100))];

        let periods = fold_rollup(Window::Day, &sales, &expenses);
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].revenue, dec!(60));
        assert_eq!(periods[0].gross_profit, dec!(30));
        assert_eq!(periods[0].expenses, dec!(7));
        assert_eq!(periods[0].net_profit, dec!(23));
    }

    #[test]
    fn monthly_and_yearly_keys() {
        let d = Utc.with_ymd_and_hms(2024, 7, 15, 0, 0, 0).unwrap();
        assert_eq!(period_key(Window::Month, d), (2024, 7, 0));
        assert_eq!(period_key(Window::Year, d), (2024, 0, 0));
    }

    #[test]
    fn valuation_groups_by_measurement_unit() {
        let products = vec![
            product_with(Some("kg"), dec!(10), 4),
            product_with(Some("kg"), dec!(20), 1),
            product_with(None, dec!(100), 2),
        ];

        let valuation = fold_valuation(&products);
        assert_eq!(valuation.total_stock, 7);
        assert_eq!(valuation.total_value, dec!(260));
        assert_eq!(valuation.by_unit.len(), 2);

        let kg = valuation.by_unit.iter().find(|u| u.unit == "kg").unwrap();
        assert_eq!(kg.total_value, dec!(60));
        assert_eq!(kg.total_stock, 5);
        assert_eq!(kg.average_price, dec!(15));
    }

    #[test]
    fn valuation_of_nothing_is_zero() {
        let valuation = fold_valuation(&[]);
        assert_eq!(valuation.total_value, Decimal::ZERO);
        assert_eq!(valuation.total_stock, 0);
        assert!(valuation.by_unit.is_empty());
    }

    #[test]
    fn sale_summary_uses_quantity_weighted_prices() {
        let day = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let sales = vec![
            sale_on(day, 10, dec!(100), dec!(100)),
            sale_on(day, 2, dec!(50), dec!(80)),
        ];

        let summary = summarize_sales(&sales);
        assert_eq!(summary.total_quantity_sold, 12);
        assert_eq!(summary.total_sale_amount, dec!(1100));
        assert_eq!(summary.revenue, dec!(1160));
        assert_eq!(summary.cost, dec!(1100));
        assert_eq!(summary.gross_profit, dec!(60));
    }
}
