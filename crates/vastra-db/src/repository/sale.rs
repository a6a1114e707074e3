//! # Sale Repository
//!
//! Sale completion, void, and reporting.
//!
//! ## Sale Completion (one transaction)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    complete_sale()                                      │
//! │                                                                         │
//! │  price_sale(lines, discount, points)   ← pure, before BEGIN            │
//! │       │                                                                 │
//! │  BEGIN ─────────────────────────────────────────────────────────────┐  │
//! │  │  customer exists?                           no → NotFound         │  │
//! │  │  points -= redeemed WHERE points >= n       0 rows → Insufficient │  │
//! │  │  INSERT sales                                                     │  │
//! │  │  for each line:                                                   │  │
//! │  │     stock -= qty WHERE stock >= qty          0 rows → Insufficient│  │
//! │  │     INSERT sale_items                                             │  │
//! │  │  customer: +points, +spend, +visit, last_visit                    │  │
//! │  COMMIT ◄──── any error above: ROLLBACK, nothing is written ─────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::{customer, product};
use vastra_core::types::{new_id, now_timestamp};
use vastra_core::{
    price_sale, CartItem, CoreError, PaymentMode, Sale, SaleItem, SalePricing, SaleStatus,
    ValidationError,
};

const SALE_COLUMNS: &str = "id, invoice_number, customer_id, ts, subtotal_cents, tax_cents, \
     discount_cents, total_cents, points_earned, points_redeemed, payment_mode, status, created_at";

const SALE_ITEM_COLUMNS: &str = "id, sale_id, product_id, product_name, product_variant, sku, \
     qty, unit_price_cents, tax_percent, tax_cents, line_total_cents";

// =============================================================================
// Request / Result Types
// =============================================================================

/// Everything needed to ring up a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRequest {
    /// Cart lines in display order.
    pub lines: Vec<CartItem>,
    pub customer_id: Option<String>,
    /// Manual discount in paise.
    pub discount_cents: i64,
    pub payment_mode: PaymentMode,
    /// Loyalty points to redeem (0 for none).
    pub redeem_points: i64,
}

/// A persisted sale with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedSale {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// One line of the daily sales report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailySaleRow {
    pub id: String,
    pub invoice_number: String,
    pub ts: DateTime<Utc>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub points_earned: i64,
    pub points_redeemed: i64,
    pub payment_mode: PaymentMode,
    pub status: SaleStatus,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
}

/// Per-day totals of completed sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub sale_date: NaiveDate,
    pub num_sales: i64,
    pub total_revenue_cents: i64,
    pub total_tax_cents: i64,
    pub total_discount_cents: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Completes a sale atomically.
    ///
    /// ## Errors
    /// Nothing is written when any of these occur:
    /// - `Domain(EmptyCart | Validation | DiscountExceedsSubtotal |
    ///   RedemptionBelowMinimum)` - rejected before the transaction
    /// - `Domain(InsufficientStock)` - a line needs more than the shelf has
    /// - `Domain(InsufficientPoints)` - redemption exceeds the balance
    /// - `NotFound` - customer or product does not exist
    pub async fn complete_sale(&self, request: &SaleRequest) -> DbResult<CompletedSale> {
        let pricing = price_sale(&request.lines, request.discount_cents, request.redeem_points)?;

        if pricing.points_redeemed > 0 && request.customer_id.is_none() {
            return Err(ValidationError::required("customer").into());
        }

        debug!(
            lines = request.lines.len(),
            subtotal_cents = pricing.subtotal_cents,
            discount_cents = pricing.discount_cents,
            customer_id = ?request.customer_id,
            "Completing sale"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        match complete_sale_on(&mut *tx, request, &pricing).await {
            Ok(done) => {
                tx.commit()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

                info!(
                    invoice = %done.sale.invoice_number,
                    total_cents = done.sale.total_cents,
                    items = done.items.len(),
                    points_earned = done.sale.points_earned,
                    "Sale completed"
                );
                Ok(done)
            }
            Err(err) => {
                warn!(error = %err, "Sale aborted, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    error!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Voids a completed sale.
    ///
    /// In one transaction: restores stock for every line, refunds redeemed
    /// points, takes back earned points, and reverses the customer's spend
    /// and visit count.
    ///
    /// ## Errors
    /// - `NotFound` - no such sale
    /// - `Domain(InvalidSaleStatus)` - already voided
    /// - `Domain(InsufficientPoints)` - the customer has already spent the
    ///   points this sale earned
    pub async fn void_sale(&self, sale_id: &str) -> DbResult<Sale> {
        debug!(sale_id = %sale_id, "Voiding sale");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        match void_sale_on(&mut *tx, sale_id).await {
            Ok(sale) => {
                tx.commit()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

                info!(
                    invoice = %sale.invoice_number,
                    total_cents = sale.total_cents,
                    "Sale voided"
                );
                Ok(sale)
            }
            Err(err) => {
                warn!(error = %err, sale_id = %sale_id, "Void aborted, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    error!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_sale_on(&mut conn, id).await
    }

    pub async fn get_by_invoice_number(&self, invoice_number: &str) -> DbResult<Option<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE invoice_number = ?1",
            SALE_COLUMNS
        );

        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(invoice_number.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Line items of a sale in the order they were rung up.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let mut conn = self.pool.acquire().await?;
        fetch_items_on(&mut conn, sale_id).await
    }

    /// Sale and items together.
    pub async fn get_with_items(&self, sale_id: &str) -> DbResult<Option<CompletedSale>> {
        let mut conn = self.pool.acquire().await?;
        let Some(sale) = fetch_sale_on(&mut conn, sale_id).await? else {
            return Ok(None);
        };
        let items = fetch_items_on(&mut conn, sale_id).await?;
        Ok(Some(CompletedSale { sale, items }))
    }

    /// All sales (any status) rung up on `date` (UTC), newest first.
    pub async fn list_for_date(&self, date: NaiveDate) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE DATE(ts) = ?1 ORDER BY ts DESC, invoice_number DESC",
            SALE_COLUMNS
        );

        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(date_key(date))
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Sales of `date` (UTC) with customer name and phone, newest first.
    pub async fn daily_report(&self, date: NaiveDate) -> DbResult<Vec<DailySaleRow>> {
        debug!(date = %date, "Building daily report");

        let rows = sqlx::query_as::<_, DailySaleRow>(
            r#"
            SELECT
                s.id,
                s.invoice_number,
                s.ts,
                s.subtotal_cents,
                s.tax_cents,
                s.discount_cents,
                s.total_cents,
                s.points_earned,
                s.points_redeemed,
                s.payment_mode,
                s.status,
                c.name AS customer_name,
                c.phone AS customer_phone
            FROM sales s
            LEFT JOIN customers c ON c.id = s.customer_id
            WHERE DATE(s.ts) = ?1
            ORDER BY s.ts DESC, s.invoice_number DESC
            "#,
        )
        .bind(date_key(date))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Per-day totals of completed sales between `from` and `to`
    /// inclusive, newest day first. Days without sales are omitted.
    pub async fn summary_between(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<DailySummary>> {
        if from > to {
            return Err(ValidationError::InvalidFormat {
                field: "date range".to_string(),
                reason: "start date is after end date".to_string(),
            }
            .into());
        }

        debug!(from = %from, to = %to, "Summarising sales");

        let rows: Vec<(String, i64, i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT
                DATE(ts) AS sale_date,
                COUNT(*) AS num_sales,
                COALESCE(SUM(total_cents), 0) AS total_revenue_cents,
                COALESCE(SUM(tax_cents), 0) AS total_tax_cents,
                COALESCE(SUM(discount_cents), 0) AS total_discount_cents
            FROM sales
            WHERE status = 'COMPLETED' AND DATE(ts) BETWEEN ?1 AND ?2
            GROUP BY DATE(ts)
            ORDER BY sale_date DESC
            "#,
        )
        .bind(date_key(from))
        .bind(date_key(to))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(day, num_sales, revenue, tax, discount)| {
                let sale_date = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                    .map_err(|e| DbError::Internal(format!("bad sale date {:?}: {}", day, e)))?;
                Ok(DailySummary {
                    sale_date,
                    num_sales,
                    total_revenue_cents: revenue,
                    total_tax_cents: tax,
                    total_discount_cents: discount,
                })
            })
            .collect()
    }
}

/// `INV-YYYYMMDD-XXXXXXXX` with eight random upper-case hex digits.
pub fn generate_invoice_number(at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "INV-{}-{}",
        at.format("%Y%m%d"),
        suffix[..8].to_ascii_uppercase()
    )
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// =============================================================================
// Transaction bodies
// =============================================================================

async fn complete_sale_on(
    conn: &mut SqliteConnection,
    request: &SaleRequest,
    pricing: &SalePricing,
) -> DbResult<CompletedSale> {
    let customer_id = request.customer_id.as_deref();

    if let Some(id) = customer_id {
        if customer::fetch_on(conn, id).await?.is_none() {
            return Err(DbError::not_found("Customer", id));
        }
    }

    if pricing.points_redeemed > 0 {
        let id = customer_id.ok_or_else(|| ValidationError::required("customer"))?;
        customer::redeem_points_on(conn, id, pricing.points_redeemed).await?;
    }

    let ts = now_timestamp();
    let points_earned = if customer_id.is_some() {
        pricing.points_earned()
    } else {
        0
    };

    let sale = Sale {
        id: new_id(),
        invoice_number: generate_invoice_number(ts),
        customer_id: request.customer_id.clone(),
        ts,
        subtotal_cents: pricing.subtotal_cents,
        tax_cents: pricing.tax_cents,
        discount_cents: pricing.discount_cents,
        total_cents: pricing.total_cents,
        points_earned,
        points_redeemed: pricing.points_redeemed,
        payment_mode: request.payment_mode,
        status: SaleStatus::Completed,
        created_at: ts,
    };

    insert_sale_on(conn, &sale).await?;

    let mut items = Vec::with_capacity(request.lines.len());
    for line in &request.lines {
        // Decrement first so a missing product reports NotFound
        // rather than a foreign key failure on the item insert.
        product::decrement_stock_on(conn, &line.product_id, line.quantity).await?;

        let item = SaleItem {
            id: new_id(),
            sale_id: sale.id.clone(),
            product_id: line.product_id.clone(),
            product_name: line.name.clone(),
            product_variant: line.variant.clone(),
            sku: line.sku.clone(),
            qty: line.quantity,
            unit_price_cents: line.unit_price_cents,
            tax_percent: line.gst_percent,
            tax_cents: line.tax_cents(),
            line_total_cents: line.line_total_cents(),
        };
        insert_item_on(conn, &item).await?;
        items.push(item);
    }

    if let Some(id) = customer_id {
        customer::record_purchase_on(conn, id, sale.total_cents, points_earned, ts).await?;
    }

    Ok(CompletedSale { sale, items })
}

async fn void_sale_on(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Sale> {
    let mut sale = fetch_sale_on(conn, sale_id)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", sale_id))?;

    if sale.status != SaleStatus::Completed {
        return Err(CoreError::InvalidSaleStatus {
            sale_id: sale.invoice_number.clone(),
            current_status: sale.status.to_string(),
        }
        .into());
    }

    for item in fetch_items_on(conn, sale_id).await? {
        product::adjust_stock_on(conn, &item.product_id, item.qty).await?;
    }

    if let Some(customer_id) = sale.customer_id.as_deref() {
        let net_refund = sale.points_redeemed - sale.points_earned;
        if net_refund > 0 {
            customer::add_points_on(conn, customer_id, net_refund).await?;
        } else if net_refund < 0 {
            customer::redeem_points_on(conn, customer_id, -net_refund).await?;
        }
        customer::reverse_purchase_on(conn, customer_id, sale.total_cents).await?;
    }

    let result = sqlx::query("UPDATE sales SET status = ?2 WHERE id = ?1 AND status = ?3")
        .bind(sale_id)
        .bind(SaleStatus::Voided)
        .bind(SaleStatus::Completed)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Sale", sale_id));
    }

    sale.status = SaleStatus::Voided;
    Ok(sale)
}

async fn insert_sale_on(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, invoice = %sale.invoice_number, "Inserting sale header");

    let sql = format!(
        "INSERT INTO sales ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        SALE_COLUMNS
    );

    sqlx::query(&sql)
        .bind(&sale.id)
        .bind(&sale.invoice_number)
        .bind(&sale.customer_id)
        .bind(sale.ts)
        .bind(sale.subtotal_cents)
        .bind(sale.tax_cents)
        .bind(sale.discount_cents)
        .bind(sale.total_cents)
        .bind(sale.points_earned)
        .bind(sale.points_redeemed)
        .bind(sale.payment_mode)
        .bind(sale.status)
        .bind(sale.created_at)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

async fn insert_item_on(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    let sql = format!(
        "INSERT INTO sale_items ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        SALE_ITEM_COLUMNS
    );

    sqlx::query(&sql)
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(&item.product_variant)
        .bind(&item.sku)
        .bind(item.qty)
        .bind(item.unit_price_cents)
        .bind(item.tax_percent)
        .bind(item.tax_cents)
        .bind(item.line_total_cents)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

async fn fetch_sale_on(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let sql = format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLUMNS);
    let sale = sqlx::query_as::<_, Sale>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(sale)
}

async fn fetch_items_on(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
    let sql = format!(
        "SELECT {} FROM sale_items WHERE sale_id = ?1 ORDER BY rowid",
        SALE_ITEM_COLUMNS
    );
    let items = sqlx::query_as::<_, SaleItem>(&sql)
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(items)
}

// =============================================================================
// Unit Tests
// =============================================================================
