//! # Product Commands
//!
//! Catalog search, barcode scanning, product maintenance and restocking.
//!
//! ## Scan Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Product Lookup Flow                                  │
//! │                                                                         │
//! │  Scanner "types" 8901234567890 + Enter                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  scan_product(code)                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  barcode ──miss──► SKU ──miss──► product id ──miss──► NOT_FOUND        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  inactive? ──yes──► BUSINESS_LOGIC "Product is inactive"               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductDto                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{ConfigState, DbState};
use vastra_core::{CoreError, Product, DEFAULT_REORDER_THRESHOLD, DEFAULT_UNIT};

/// Product as shown on the counter screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub sku: String,
    pub barcode: String,
    pub name: String,
    pub variant: String,
    /// `name - variant`, as printed on receipts.
    pub display_name: String,
    pub category: String,
    pub brand: String,
    pub mrp_cents: i64,
    pub sell_price_cents: i64,
    pub gst_percent: i64,
    pub hsn_code: String,
    pub stock: i64,
    pub reorder_threshold: i64,
    pub unit: String,
    pub is_low_stock: bool,
    pub is_out_of_stock: bool,
    pub is_active: bool,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            display_name: p.display_name(),
            is_low_stock: p.is_low_stock(),
            is_out_of_stock: p.is_out_of_stock(),
            id: p.id,
            sku: p.sku,
            barcode: p.barcode,
            name: p.name,
            variant: p.variant,
            category: p.category,
            brand: p.brand,
            mrp_cents: p.mrp_cents,
            sell_price_cents: p.sell_price_cents,
            gst_percent: p.gst_percent,
            hsn_code: p.hsn_code,
            stock: p.stock,
            reorder_threshold: p.reorder_threshold,
            unit: p.unit,
            is_active: p.is_active,
        }
    }
}

/// Product form submitted from the catalog screen.
///
/// `mrp_cents` defaults to the selling price, `unit` to `PCS`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductForm {
    pub name: String,
    pub variant: String,
    pub category: String,
    pub brand: String,
    pub barcode: String,
    pub sku: String,
    pub mrp_cents: Option<i64>,
    pub sell_price_cents: i64,
    pub purchase_price_cents: i64,
    pub gst_percent: i64,
    pub hsn_code: String,
    /// Opening stock. Ignored on update; use `restock` or `set_stock`.
    pub stock: i64,
    pub reorder_threshold: Option<i64>,
    pub unit: Option<String>,
    pub description: String,
}

impl ProductForm {
    /// Copies the form onto `product`, leaving id, stock and timestamps.
    fn apply_to(self, product: &mut Product) {
        product.name = self.name.trim().to_string();
        product.variant = self.variant.trim().to_string();
        product.category = self.category.trim().to_string();
        product.brand = self.brand.trim().to_string();
        product.barcode = self.barcode.trim().to_string();
        product.sku = self.sku.trim().to_string();
        product.mrp_cents = self.mrp_cents.unwrap_or(self.sell_price_cents);
        product.sell_price_cents = self.sell_price_cents;
        product.purchase_price_cents = self.purchase_price_cents;
        product.gst_percent = self.gst_percent;
        product.hsn_code = self.hsn_code.trim().to_string();
        product.reorder_threshold = self.reorder_threshold.unwrap_or(DEFAULT_REORDER_THRESHOLD);
        product.unit = self
            .unit
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_UNIT.to_string());
        product.description = self.description;
    }
}

/// Checks if a query looks like a barcode (8-13 numeric digits).
fn is_barcode_query(query: &str) -> bool {
    let len = query.len();
    (8..=13).contains(&len) && query.chars().all(|c| c.is_ascii_digit())
}

/// Searches active products by name.
///
/// A query that looks like a barcode is tried as an exact barcode first,
/// so a scan into the search box lands on one product.
pub async fn search_products(db: &DbState, query: &str) -> Result<Vec<ProductDto>, ApiError> {
    let start = Instant::now();
    let query = query.trim();

    debug!(query = %query, "search_products command");

    let products = db.inner().products();

    if is_barcode_query(query) {
        if let Some(product) = products.get_by_barcode(query).await? {
            if product.is_active {
                debug!(barcode = %query, "search_products barcode hit");
                return Ok(vec![ProductDto::from(product)]);
            }
        }
    }

    let dtos: Vec<ProductDto> = products
        .search_by_name(query)
        .await?
        .into_iter()
        .map(ProductDto::from)
        .collect();

    debug!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        count = dtos.len(),
        "search_products complete"
    );

    Ok(dtos)
}

/// Resolves a scanned or typed code to a sellable product.
pub async fn scan_product(db: &DbState, code: &str) -> Result<ProductDto, ApiError> {
    debug!(code = %code, "scan_product command");

    let product = db
        .inner()
        .products()
        .find_by_code(code)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", code.trim()))?;

    if !product.is_active {
        return Err(CoreError::ProductInactive(product.display_name()).into());
    }

    Ok(ProductDto::from(product))
}

pub async fn get_product_by_id(db: &DbState, id: &str) -> Result<ProductDto, ApiError> {
    debug!(id = %id, "get_product_by_id command");
    let product = db
        .inner()
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;
    Ok(ProductDto::from(product))
}

/// Adds a product to the catalog.
pub async fn add_product(db: &DbState, form: ProductForm) -> Result<ProductDto, ApiError> {
    debug!(name = %form.name, sku = %form.sku, "add_product command");

    let mut product = Product::new(String::new(), 0);
    product.stock = form.stock;
    form.apply_to(&mut product);

    let product = db.inner().products().insert(&product).await?;
    info!(id = %product.id, sku = %product.sku, "Product added");
    Ok(ProductDto::from(product))
}

/// Edits a product's catalog fields. Stock is written back as it was read.
pub async fn update_product(
    db: &DbState,
    id: &str,
    form: ProductForm,
) -> Result<ProductDto, ApiError> {
    debug!(id = %id, "update_product command");

    let products = db.inner().products();
    let mut product = products
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    form.apply_to(&mut product);
    let product = products.update(&product).await?;
    Ok(ProductDto::from(product))
}

/// Hides a product from search and scanning.
pub async fn delete_product(db: &DbState, id: &str) -> Result<(), ApiError> {
    debug!(id = %id, "delete_product command");
    db.inner().products().soft_delete(id).await?;
    info!(id = %id, "Product deactivated");
    Ok(())
}

/// Products at or below their reorder threshold, lowest stock first.
pub async fn list_low_stock(db: &DbState) -> Result<Vec<ProductDto>, ApiError> {
    debug!("list_low_stock command");
    let products = db.inner().products().list_low_stock().await?;
    Ok(products.into_iter().map(ProductDto::from).collect())
}

/// Receives `quantity` units. Returns the new stock.
pub async fn restock(db: &DbState, product_id: &str, quantity: i64) -> Result<i64, ApiError> {
    debug!(product_id = %product_id, quantity = quantity, "restock command");

    if quantity <= 0 {
        return Err(ApiError::validation("Restock quantity must be positive"));
    }

    let stock = db.inner().products().adjust_stock(product_id, quantity).await?;
    info!(product_id = %product_id, quantity = quantity, stock = stock, "Stock received");
    Ok(stock)
}

/// Overwrites the stock count after a physical count.
pub async fn set_stock(db: &DbState, product_id: &str, stock: i64) -> Result<ProductDto, ApiError> {
    debug!(product_id = %product_id, stock = stock, "set_stock command");

    let products = db.inner().products();
    products.set_stock(product_id, stock).await?;
    let product = products
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", product_id))?;
    Ok(ProductDto::from(product))
}

/// Text of the shelf label for a product.
pub async fn print_label(
    db: &DbState,
    config: &ConfigState,
    product_id: &str,
) -> Result<String, ApiError> {
    debug!(product_id = %product_id, "print_label command");

    let product = db
        .inner()
        .products()
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", product_id))?;

    Ok(config.receipt_layout().render_barcode_label(&product))
}
