//! # Product Repository
//!
//! Database operations for the clothing catalog.
//!
//! ## Key Operations
//! - Scan lookup (barcode → SKU → id)
//! - Name search (`LIKE %q%`)
//! - CRUD and soft delete
//! - Guarded stock updates
//!
//! ## Guarded Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ Read-then-write (races with itself across two statements)          │
//! │     SELECT stock ...; UPDATE products SET stock = 7 ...                │
//! │                                                                         │
//! │  ✅ Guarded delta (one statement)                                      │
//! │     UPDATE products SET stock = stock - 3                              │
//! │     WHERE id = ? AND stock >= 3                                        │
//! │                                                                         │
//! │  rows_affected == 0 → product missing or not enough stock              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{like_pattern, non_empty};
use vastra_core::types::now_timestamp;
use vastra_core::validation::{validate_product, validate_search_query, validate_stock};
use vastra_core::{CoreError, Product, DEFAULT_UNIT};

const PRODUCT_COLUMNS: &str = "id, name, variant, category, brand, barcode, sku, \
     mrp_cents, sell_price_cents, purchase_price_cents, gst_percent, hsn_code, \
     stock, reorder_threshold, unit, description, image_path, is_active, \
     created_at, updated_at";

/// Row shape of the `products` table; optional text is nullable.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    variant: Option<String>,
    category: Option<String>,
    brand: Option<String>,
    barcode: Option<String>,
    sku: Option<String>,
    mrp_cents: i64,
    sell_price_cents: i64,
    purchase_price_cents: i64,
    gst_percent: i64,
    hsn_code: Option<String>,
    stock: i64,
    reorder_threshold: i64,
    unit: Option<String>,
    description: Option<String>,
    image_path: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let unit = row
            .unit
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_UNIT.to_string());

        Product {
            id: row.id,
            name: row.name,
            variant: row.variant.unwrap_or_default(),
            category: row.category.unwrap_or_default(),
            brand: row.brand.unwrap_or_default(),
            barcode: row.barcode.unwrap_or_default(),
            sku: row.sku.unwrap_or_default(),
            mrp_cents: row.mrp_cents,
            sell_price_cents: row.sell_price_cents,
            purchase_price_cents: row.purchase_price_cents,
            gst_percent: row.gst_percent,
            hsn_code: row.hsn_code.unwrap_or_default(),
            stock: row.stock,
            reorder_threshold: row.reorder_threshold,
            unit,
            description: row.description.unwrap_or_default(),
            image_path: row.image_path.unwrap_or_default(),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let hits = repo.search_by_name("kurta").await?;
/// let scanned = repo.find_by_code("8901234567890").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The stored product
    /// * `Err(DbError::Domain(Validation))` - A field failed validation
    /// * `Err(DbError::UniqueViolation)` - SKU or barcode already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        validate_product(product)?;

        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        let sql = format!(
            "INSERT INTO products ({}) VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
            PRODUCT_COLUMNS
        );

        sqlx::query(&sql)
            .bind(&product.id)
            .bind(&product.name)
            .bind(non_empty(&product.variant))
            .bind(non_empty(&product.category))
            .bind(non_empty(&product.brand))
            .bind(non_empty(&product.barcode))
            .bind(non_empty(&product.sku))
            .bind(product.mrp_cents)
            .bind(product.sell_price_cents)
            .bind(product.purchase_price_cents)
            .bind(product.gst_percent)
            .bind(non_empty(&product.hsn_code))
            .bind(product.stock)
            .bind(product.reorder_threshold)
            .bind(non_empty(&product.unit))
            .bind(non_empty(&product.description))
            .bind(non_empty(&product.image_path))
            .bind(product.is_active)
            .bind(product.created_at)
            .bind(product.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| with_duplicate_value(e.into(), product))?;

        Ok(product.clone())
    }

    /// Writes every editable field of a product, stock included.
    ///
    /// Stock is stored exactly as given. Receiving goods goes through
    /// [`adjust_stock`](Self::adjust_stock) instead.
    pub async fn update(&self, product: &Product) -> DbResult<Product> {
        validate_product(product)?;

        debug!(id = %product.id, "Updating product");

        let now = now_timestamp();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                variant = ?3,
                category = ?4,
                brand = ?5,
                barcode = ?6,
                sku = ?7,
                mrp_cents = ?8,
                sell_price_cents = ?9,
                purchase_price_cents = ?10,
                gst_percent = ?11,
                hsn_code = ?12,
                stock = ?13,
                reorder_threshold = ?14,
                unit = ?15,
                description = ?16,
                image_path = ?17,
                is_active = ?18,
                updated_at = ?19
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(non_empty(&product.variant))
        .bind(non_empty(&product.category))
        .bind(non_empty(&product.brand))
        .bind(non_empty(&product.barcode))
        .bind(non_empty(&product.sku))
        .bind(product.mrp_cents)
        .bind(product.sell_price_cents)
        .bind(product.purchase_price_cents)
        .bind(product.gst_percent)
        .bind(non_empty(&product.hsn_code))
        .bind(product.stock)
        .bind(product.reorder_threshold)
        .bind(non_empty(&product.unit))
        .bind(non_empty(&product.description))
        .bind(non_empty(&product.image_path))
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| with_duplicate_value(e.into(), product))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        let mut updated = product.clone();
        updated.updated_at = now;
        Ok(updated)
    }

    /// Sets an absolute stock count (stock take).
    pub async fn set_stock(&self, id: &str, stock: i64) -> DbResult<()> {
        validate_stock(stock)?;

        debug!(id = %id, stock = stock, "Setting stock");

        let result = sqlx::query("UPDATE products SET stock = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(stock)
            .bind(now_timestamp())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Changes stock by `delta` (positive when receiving goods).
    ///
    /// Rejects changes that would leave stock below zero.
    ///
    /// ## Returns
    /// The new stock level.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        adjust_stock_on(&mut conn, id, delta).await
    }

    /// Removes `qty` units if at least that many are on the shelf.
    pub async fn decrement_stock(&self, id: &str, qty: i64) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        decrement_stock_on(&mut conn, id, qty).await
    }

    /// Hides a product from search and scanning. History keeps referencing it.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result =
            sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(now_timestamp())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        self.fetch_one_where("id = ?1", id).await
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        self.fetch_one_where("sku = ?1", sku.trim()).await
    }

    /// Gets a product by its printed barcode.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        self.fetch_one_where("barcode = ?1", barcode.trim()).await
    }

    /// Resolves whatever the scanner or cashier typed.
    ///
    /// ## Lookup Order
    /// ```text
    /// barcode ──miss──► SKU ──miss──► product id ──miss──► None
    /// ```
    pub async fn find_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(None);
        }

        debug!(code = %code, "Resolving product code");

        if let Some(product) = self.get_by_barcode(code).await? {
            return Ok(Some(product));
        }
        if let Some(product) = self.get_by_sku(code).await? {
            return Ok(Some(product));
        }
        self.get_by_id(code).await
    }

    /// Searches active products whose name contains `query`.
    ///
    /// An empty query lists every active product.
    pub async fn search_by_name(&self, query: &str) -> DbResult<Vec<Product>> {
        let query = validate_search_query(query)?;

        debug!(query = %query, "Searching products");

        if query.is_empty() {
            return self.list_all().await;
        }

        let sql = format!(
            "SELECT {} FROM products \
             WHERE is_active = 1 AND name LIKE ?1 ESCAPE '\\' \
             ORDER BY name",
            PRODUCT_COLUMNS
        );

        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(like_pattern(&query))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Search returned products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Lists active products ordered by name.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE is_active = 1 ORDER BY name",
            PRODUCT_COLUMNS
        );

        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Active products at or below their reorder threshold, emptiest first.
    pub async fn list_low_stock(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products \
             WHERE is_active = 1 AND stock <= reorder_threshold \
             ORDER BY stock ASC, name",
            PRODUCT_COLUMNS
        );

        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Low stock products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Number of active products.
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn fetch_one_where(&self, condition: &str, value: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE {}", PRODUCT_COLUMNS, condition);

        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }
}

// =============================================================================
// Connection-level statements (shared with the sale transaction)
// =============================================================================

/// Guarded decrement: `stock = stock - qty WHERE stock >= qty`.
///
/// ## Errors
/// - `NotFound` when the product does not exist
/// - `Domain(InsufficientStock)` when the shelf has fewer than `qty`
pub(crate) async fn decrement_stock_on(
    conn: &mut SqliteConnection,
    id: &str,
    qty: i64,
) -> DbResult<()> {
    debug!(id = %id, qty = qty, "Decrementing stock");

    let result = sqlx::query(
        "UPDATE products SET stock = stock - ?2, updated_at = ?3 WHERE id = ?1 AND stock >= ?2",
    )
    .bind(id)
    .bind(qty)
    .bind(now_timestamp())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(stock_shortfall(conn, id, qty).await);
    }

    Ok(())
}

/// Guarded delta: applies `delta` only if stock stays non-negative.
pub(crate) async fn adjust_stock_on(
    conn: &mut SqliteConnection,
    id: &str,
    delta: i64,
) -> DbResult<i64> {
    debug!(id = %id, delta = delta, "Adjusting stock");

    let result = sqlx::query(
        "UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1 AND stock + ?2 >= 0",
    )
    .bind(id)
    .bind(delta)
    .bind(now_timestamp())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(stock_shortfall(conn, id, -delta).await);
    }

    let stock: i64 = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(stock)
}

/// Explains why a guarded stock update touched no row.
async fn stock_shortfall(conn: &mut SqliteConnection, id: &str, requested: i64) -> DbError {
    let row: Result<Option<(String, Option<String>, i64)>, sqlx::Error> =
        sqlx::query_as("SELECT name, variant, stock FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await;

    match row {
        Ok(Some((name, variant, available))) => {
            let product = match variant.filter(|v| !v.is_empty()) {
                Some(variant) => format!("{} - {}", name, variant),
                None => name,
            };
            CoreError::InsufficientStock {
                product,
                available,
                requested,
            }
            .into()
        }
        Ok(None) => DbError::not_found("Product", id),
        Err(e) => e.into(),
    }
}

/// Fills in the offending value on a unique violation.
fn with_duplicate_value(err: DbError, product: &Product) -> DbError {
    match err {
        DbError::UniqueViolation { field, .. } if field.ends_with(".sku") => {
            DbError::duplicate("sku", &product.sku)
        }
        DbError::UniqueViolation { field, .. } if field.ends_with(".barcode") => {
            DbError::duplicate("barcode", &product.barcode)
        }
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{insert_product, product, test_db};
    use proptest::prelude::*;

    fn full_product() -> Product {
        let mut p = Product::new("Chanderi Silk Saree", 459_900);
        p.variant = "Maroon".to_string();
        p.category = "SAREE".to_string();
        p.brand = "Weaves of India".to_string();
        p.barcode = "8901234500017".to_string();
        p.sku = "SAR-CHN-MRN".to_string();
        p.mrp_cents = 499_900;
        p.purchase_price_cents = 310_000;
        p.gst_percent = 12;
        p.hsn_code = "5007".to_string();
        p.stock = 7;
        p.reorder_threshold = 2;
        p.unit = "PCS".to_string();
        p.description = "Handwoven".to_string();
        p.image_path = "images/sar-chn-mrn.jpg".to_string();
        p
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let db = test_db().await;
        let p = full_product();

        db.products().insert(&p).await.unwrap();
        let fetched = db.products().get_by_id(&p.id).await.unwrap().unwrap();

        assert_eq!(fetched, p);
    }

    #[tokio::test]
    async fn test_optional_text_reads_back_empty() {
        let db = test_db().await;
        let mut p = Product::new("Plain Tee", 29_900);
        p.unit = String::new();

        db.products().insert(&p).await.unwrap();
        let fetched = db.products().get_by_id(&p.id).await.unwrap().unwrap();

        assert_eq!(fetched.variant, "");
        assert_eq!(fetched.brand, "");
        assert_eq!(fetched.barcode, "");
        assert_eq!(fetched.sku, "");
        assert_eq!(fetched.unit, "PCS");
    }

    #[tokio::test]
    async fn test_products_without_codes_do_not_collide() {
        let db = test_db().await;
        db.products().insert(&Product::new("A", 100)).await.unwrap();
        db.products().insert(&Product::new("B", 100)).await.unwrap();
        assert_eq!(db.products().count_active().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = test_db().await;
        insert_product(&db, "TEE-01", 29_900, 1).await;

        let err = db
            .products()
            .insert(&product("TEE-01", 19_900, 1))
            .await
            .unwrap_err();

        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "sku");
                assert_eq!(value, "TEE-01");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_product_rejected() {
        let db = test_db().await;
        let mut p = product("TEE-02", 29_900, 1);
        p.gst_percent = 150;

        assert!(matches!(
            db.products().insert(&p).await,
            Err(DbError::Domain(CoreError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_find_by_code_order() {
        let db = test_db().await;
        let p = db.products().insert(&full_product()).await.unwrap();

        let by_barcode = db.products().find_by_code("8901234500017").await.unwrap();
        let by_sku = db.products().find_by_code(" SAR-CHN-MRN ").await.unwrap();
        let by_id = db.products().find_by_code(&p.id).await.unwrap();

        assert_eq!(by_barcode.unwrap().id, p.id);
        assert_eq!(by_sku.unwrap().id, p.id);
        assert_eq!(by_id.unwrap().id, p.id);
        assert!(db.products().find_by_code("nope").await.unwrap().is_none());
        assert!(db.products().find_by_code("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_by_name() {
        let db = test_db().await;
        let mut a = product("KRT-1", 100, 1);
        a.name = "Cotton Kurta".to_string();
        let mut b = product("KRT-2", 100, 1);
        b.name = "Anarkali Kurta".to_string();
        let mut c = product("JNS-1", 100, 1);
        c.name = "Slim Jeans".to_string();
        for p in [&a, &b, &c] {
            db.products().insert(p).await.unwrap();
        }

        let hits = db.products().search_by_name("kurta").await.unwrap();
        let names: Vec<_> = hits.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Anarkali Kurta", "Cotton Kurta"]);

        assert_eq!(db.products().search_by_name("").await.unwrap().len(), 3);
        assert!(db.products().search_by_name("%").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_soft_deleted_products_are_hidden() {
        let db = test_db().await;
        let p = insert_product(&db, "OLD-1", 100, 1).await;

        db.products().soft_delete(&p.id).await.unwrap();

        assert!(db.products().list_all().await.unwrap().is_empty());
        assert_eq!(db.products().count_active().await.unwrap(), 0);
        let fetched = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert!(!fetched.is_active);
    }

    #[tokio::test]
    async fn test_list_low_stock_ordered_by_stock() {
        let db = test_db().await;
        insert_product(&db, "LOW-3", 100, 3).await;
        insert_product(&db, "LOW-0", 100, 0).await;
        insert_product(&db, "OK-50", 100, 50).await;

        let low = db.products().list_low_stock().await.unwrap();
        let skus: Vec<_> = low.iter().map(|p| p.sku.as_str()).collect();
        assert_eq!(skus, vec!["LOW-0", "LOW-3"]);
    }

    #[tokio::test]
    async fn test_update() {
        let db = test_db().await;
        let mut p = insert_product(&db, "UPD-1", 100, 1).await;

        p.sell_price_cents = 250;
        p.brand = "Raymond".to_string();
        p.stock = 7;
        db.products().update(&p).await.unwrap();

        let fetched = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(fetched.sell_price_cents, 250);
        assert_eq!(fetched.brand, "Raymond");
        assert_eq!(fetched.stock, 7);

        let ghost = product("GHOST", 100, 1);
        assert!(db.products().update(&ghost).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_decrement_stock_guard() {
        let db = test_db().await;
        let p = insert_product(&db, "DEC-1", 100, 2).await;

        db.products().decrement_stock(&p.id, 2).await.unwrap();
        let err = db.products().decrement_stock(&p.id, 1).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                available: 0,
                requested: 1,
                ..
            })
        ));
        let fetched = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(fetched.stock, 0);

        assert!(db
            .products()
            .decrement_stock("missing", 1)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_adjust_and_set_stock() {
        let db = test_db().await;
        let p = insert_product(&db, "ADJ-1", 100, 2).await;

        assert_eq!(db.products().adjust_stock(&p.id, 10).await.unwrap(), 12);
        assert_eq!(db.products().adjust_stock(&p.id, -12).await.unwrap(), 0);
        assert!(db.products().adjust_stock(&p.id, -1).await.is_err());

        db.products().set_stock(&p.id, 40).await.unwrap();
        let fetched = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(fetched.stock, 40);

        assert!(db.products().set_stock(&p.id, -1).await.is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_insert_round_trip(
            name in "[A-Za-z][A-Za-z ]{0,30}",
            variant in "[A-Za-z0-9 /]{0,10}",
            brand in "[A-Za-z]{0,12}",
            price in 0i64..10_000_000,
            gst in 0i64..=28,
            stock in 0i64..1_000,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let db = test_db().await;
                let mut p = Product::new(name, price);
                p.variant = variant;
                p.brand = brand;
                p.gst_percent = gst;
                p.stock = stock;

                db.products().insert(&p).await.unwrap();
                let fetched = db.products().get_by_id(&p.id).await.unwrap().unwrap();

                let mut expected = p.clone();
                if expected.variant.trim().is_empty() {
                    expected.variant = String::new();
                }
                assert_eq!(fetched, expected);
            });
        }
    }
}
