//! # Report Commands
//!
//! Daily sales report, date-range summary, low-stock alerts and the
//! store status printed at startup.
//!
//! Dates are calendar days in UTC, matching how sale timestamps are stored.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::{ConfigState, DbState};
use vastra_core::SaleStatus;
use vastra_db::{DailySaleRow, DailySummary};

/// Sales of one day with totals over the completed ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    pub date: NaiveDate,
    /// Newest first, voided sales included.
    pub sales: Vec<DailySaleRow>,
    pub num_sales: i64,
    pub total_revenue_cents: i64,
    pub total_tax_cents: i64,
    pub total_discount_cents: i64,
    pub num_voided: i64,
}

impl DailyReport {
    fn new(date: NaiveDate, sales: Vec<DailySaleRow>) -> Self {
        let mut report = DailyReport {
            date,
            sales: Vec::new(),
            num_sales: 0,
            total_revenue_cents: 0,
            total_tax_cents: 0,
            total_discount_cents: 0,
            num_voided: 0,
        };

        for row in &sales {
            match row.status {
                SaleStatus::Completed => {
                    report.num_sales += 1;
                    report.total_revenue_cents += row.total_cents;
                    report.total_tax_cents += row.tax_cents;
                    report.total_discount_cents += row.discount_cents;
                }
                SaleStatus::Voided => report.num_voided += 1,
            }
        }

        report.sales = sales;
        report
    }
}

/// A product that needs reordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockAlert {
    pub product_id: String,
    pub display_name: String,
    pub sku: String,
    pub stock: i64,
    pub reorder_threshold: i64,
    pub out_of_stock: bool,
}

/// Snapshot printed by the binary at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatus {
    pub store_name: String,
    pub active_products: i64,
    pub active_customers: i64,
    pub low_stock_products: usize,
    pub today: NaiveDate,
    pub sales_today: i64,
    /// Formatted with the store currency, e.g. `₹12499.00`.
    pub revenue_today: String,
}

/// Report for `date`, today when `None`.
pub async fn daily_report(db: &DbState, date: Option<NaiveDate>) -> Result<DailyReport, ApiError> {
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    debug!(%date, "daily_report command");

    let rows = db.inner().sales().daily_report(date).await?;
    Ok(DailyReport::new(date, rows))
}

/// Per-day totals between two dates, inclusive, newest first.
pub async fn sales_summary(
    db: &DbState,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DailySummary>, ApiError> {
    debug!(%from, %to, "sales_summary command");
    Ok(db.inner().sales().summary_between(from, to).await?)
}

/// Low-stock products, or nothing when alerts are switched off.
pub async fn low_stock_alerts(
    db: &DbState,
    config: &ConfigState,
) -> Result<Vec<LowStockAlert>, ApiError> {
    debug!("low_stock_alerts command");

    if !config.low_stock_alert {
        return Ok(Vec::new());
    }

    let products = db.inner().products().list_low_stock().await?;
    Ok(products
        .into_iter()
        .map(|p| LowStockAlert {
            display_name: p.display_name(),
            out_of_stock: p.is_out_of_stock(),
            product_id: p.id,
            sku: p.sku,
            stock: p.stock,
            reorder_threshold: p.reorder_threshold,
        })
        .collect())
}

pub async fn store_status(db: &DbState, config: &ConfigState) -> Result<StoreStatus, ApiError> {
    let database = db.inner();
    let today = Utc::now().date_naive();

    let summary = database.sales().summary_between(today, today).await?;
    let (sales_today, revenue_cents) = summary
        .first()
        .map(|s| (s.num_sales, s.total_revenue_cents))
        .unwrap_or((0, 0));

    Ok(StoreStatus {
        store_name: config.store_name.clone(),
        active_products: database.products().count_active().await?,
        active_customers: database.customers().count_active().await?,
        low_stock_products: database.products().list_low_stock().await?.len(),
        today,
        sales_today,
        revenue_today: config.format_currency(revenue_cents),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::add_to_cart;
    use crate::commands::sale::{checkout, void_sale};
    use crate::commands::test_support::{stocked_product, test_app};
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_daily_report_excludes_voided_from_totals() {
        let app = test_app().await;
        let product = stocked_product(&app, "TEE-M-9", 49_900, 10).await;

        for _ in 0..2 {
            add_to_cart(&app.db, &app.cart, &product.id, None)
                .await
                .unwrap();
            checkout(&app.db, &app.cart, &app.config, "cash")
                .await
                .unwrap();
        }
        add_to_cart(&app.db, &app.cart, &product.id, Some(3))
            .await
            .unwrap();
        let voided = checkout(&app.db, &app.cart, &app.config, "card")
            .await
            .unwrap();
        void_sale(&app.db, &voided.sale.id).await.unwrap();

        let report = daily_report(&app.db, None).await.unwrap();
        assert_eq!(report.sales.len(), 3);
        assert_eq!(report.num_sales, 2);
        assert_eq!(report.num_voided, 1);
        assert_eq!(report.total_revenue_cents, 99_800);

        let summary = sales_summary(&app.db, report.date, report.date)
            .await
            .unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].total_revenue_cents, 99_800);
    }

    #[tokio::test]
    async fn test_sales_summary_rejects_reversed_range() {
        let app = test_app().await;
        let today = Utc::now().date_naive();
        let yesterday = today.pred_opt().unwrap();

        let err = sales_summary(&app.db, today, yesterday).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_low_stock_alerts_respect_config() {
        let mut app = test_app().await;
        stocked_product(&app, "SAREE-5", 249_900, 0).await;
        stocked_product(&app, "SHIRT-5", 89_900, 30).await;

        let alerts = low_stock_alerts(&app.db, &app.config).await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].sku, "SAREE-5");
        assert!(alerts[0].out_of_stock);

        app.config.low_stock_alert = false;
        assert!(low_stock_alerts(&app.db, &app.config)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_store_status() {
        let app = test_app().await;
        let product = stocked_product(&app, "KURTA-S-4", 119_900, 8).await;
        add_to_cart(&app.db, &app.cart, &product.id, None)
            .await
            .unwrap();
        checkout(&app.db, &app.cart, &app.config, "upi")
            .await
            .unwrap();

        let status = store_status(&app.db, &app.config).await.unwrap();
        assert_eq!(status.active_products, 1);
        assert_eq!(status.active_customers, 0);
        assert_eq!(status.sales_today, 1);
        assert_eq!(status.revenue_today, "₹1199.00");
    }
}
