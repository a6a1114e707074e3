//! # Cart
//!
//! The in-progress sale at the counter.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Cashier Action           Service Command         Cart Change           │
//! │  ──────────────           ───────────────         ───────────           │
//! │                                                                         │
//! │  Scan barcode ───────────► scan_to_cart() ──────► add_item(p, 1)       │
//! │                                                                         │
//! │  Change Quantity ────────► update_cart_item() ──► items[i].qty = n     │
//! │                                                                         │
//! │  Click Remove ───────────► remove_from_cart() ──► items.remove(i)      │
//! │                                                                         │
//! │  Checkout ───────────────► checkout() ──────────► lines → SaleRequest  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock check here uses the stock seen when the product was scanned.
//! The sale transaction re-checks against the database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::validation::validate_quantity;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// An item in the shopping cart.
///
/// ## Design Notes
/// Product fields are frozen at the time of adding, so the cart shows the
/// price the customer was quoted even if the catalog changes meanwhile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub variant: String,

    /// GST-inclusive selling price in paise (frozen).
    pub unit_price_cents: i64,
    pub mrp_cents: i64,
    pub gst_percent: i64,

    pub quantity: i64,

    /// Shelf stock seen when the product was scanned.
    pub stock_snapshot: i64,

    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Snapshots a product into a cart line.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            variant: product.variant.clone(),
            unit_price_cents: product.sell_price_cents,
            mrp_cents: product.mrp_cents,
            gst_percent: product.gst_percent,
            quantity,
            stock_snapshot: product.stock,
            added_at: Utc::now(),
        }
    }

    pub fn display_name(&self) -> String {
        if self.variant.is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", self.name, self.variant)
        }
    }

    /// Unit price × quantity.
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }

    /// GST contained in the line total.
    pub fn tax_cents(&self) -> i64 {
        Money::from_cents(self.line_total_cents())
            .inclusive_tax(self.gst_percent)
            .cents()
    }

    fn check_stock(&self, quantity: i64) -> CoreResult<()> {
        if quantity > self.stock_snapshot {
            return Err(CoreError::InsufficientStock {
                product: self.display_name(),
                available: self.stock_snapshot,
                requested: quantity,
            });
        }
        Ok(())
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `product_id`
/// - Every quantity is in `1..=MAX_ITEM_QUANTITY`
/// - At most `MAX_CART_ITEMS` lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,

    /// When the cart was created/last cleared
    pub created_at: DateTime<Utc>,
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds a product to the cart or increases quantity if already present.
    ///
    /// ## Errors
    /// - `ProductInactive` for soft-deleted products
    /// - `QuantityTooLarge` if the merged quantity exceeds the maximum
    /// - `InsufficientStock` if the merged quantity exceeds the shelf stock
    /// - `CartTooLarge` when a new line would exceed the line limit
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        if !product.is_active {
            return Err(CoreError::ProductInactive(product.display_name()));
        }
        validate_quantity(quantity)?;

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let new_qty = item.quantity + quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            // Refresh the snapshot; the caller just read the product.
            item.stock_snapshot = product.stock;
            item.check_stock(new_qty)?;
            item.quantity = new_qty;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        let item = CartItem::from_product(product, quantity);
        item.check_stock(quantity)?;
        self.items.push(item);
        Ok(())
    }

    /// Sets the quantity of a line. A quantity of 0 removes the line.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
        validate_quantity(quantity)?;

        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| CoreError::ProductNotInCart(product_id.to_string()))?;

        item.check_stock(quantity)?;
        item.quantity = quantity;
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::ProductNotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.created_at = Utc::now();
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn subtotal_cents(&self) -> i64 {
        self.items.iter().map(|i| i.line_total_cents()).sum()
    }

    pub fn tax_cents(&self) -> i64 {
        self.items.iter().map(|i| i.tax_cents()).sum()
    }

    /// Totals with the given discount applied.
    pub fn totals(&self, discount_cents: i64) -> CartTotals {
        CartTotals::compute(&self.items, discount_cents)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

/// Cart totals summary for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal_cents: i64,
    /// GST contained in the subtotal. Not added to the total.
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
}

impl CartTotals {
    /// Sums the lines and applies the discount.
    ///
    /// ## Example
    /// ```rust
    /// use vastra_core::{CartTotals, Product};
    /// use vastra_core::cart::CartItem;
    ///
    /// let mut tee = Product::new("Graphic Tee", 59_900);
    /// tee.stock = 10;
    /// tee.gst_percent = 5;
    /// let lines = vec![CartItem::from_product(&tee, 2)];
    ///
    /// let totals = CartTotals::compute(&lines, 10_000);
    /// assert_eq!(totals.subtotal_cents, 119_800);
    /// assert_eq!(totals.total_cents, 109_800);
    /// ```
    pub fn compute(lines: &[CartItem], discount_cents: i64) -> Self {
        let subtotal_cents: i64 = lines.iter().map(|i| i.line_total_cents()).sum();
        CartTotals {
            item_count: lines.len(),
            total_quantity: lines.iter().map(|i| i.quantity).sum(),
            subtotal_cents,
            tax_cents: lines.iter().map(|i| i.tax_cents()).sum(),
            discount_cents,
            total_cents: subtotal_cents - discount_cents,
        }
    }
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals::compute(&cart.items, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_product(id: &str, price_cents: i64, stock: i64) -> Product {
        let mut p = Product::new(format!("Product {}", id), price_cents);
        p.id = id.to_string();
        p.sku = format!("SKU-{}", id);
        p.gst_percent = 12;
        p.stock = stock;
        p
    }

    #[test]
    fn test_cart_add_item() {
        let mut cart = Cart::new();
        let product = test_product("1", 99_900, 10);

        cart.add_item(&product, 2).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.subtotal_cents(), 199_800);
    }

    #[test]
    fn test_cart_add_same_product_increases_quantity() {
        let mut cart = Cart::new();
        let product = test_product("1", 99_900, 10);

        cart.add_item(&product, 2).unwrap();
        cart.add_item(&product, 3).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_cart_rejects_more_than_stock() {
        let mut cart = Cart::new();
        let product = test_product("1", 99_900, 3);

        cart.add_item(&product, 2).unwrap();
        let err = cart.add_item(&product, 2).unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 3,
                requested: 4,
                ..
            }
        ));
        assert_eq!(cart.total_quantity(), 2);
    }

    #[test]
    fn test_cart_rejects_inactive_product() {
        let mut cart = Cart::new();
        let mut product = test_product("1", 99_900, 3);
        product.is_active = false;

        assert!(matches!(
            cart.add_item(&product, 1),
            Err(CoreError::ProductInactive(_))
        ));
    }

    #[test]
    fn test_cart_rejects_zero_quantity() {
        let mut cart = Cart::new();
        let product = test_product("1", 99_900, 3);
        assert!(matches!(
            cart.add_item(&product, 0),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_cart_tax_is_inclusive() {
        let mut cart = Cart::new();
        let product = test_product("1", 11_200, 5);

        cart.add_item(&product, 1).unwrap();

        assert_eq!(cart.tax_cents(), 1_200);
        let totals = cart.totals(0);
        assert_eq!(totals.total_cents, 11_200);
    }

    #[test]
    fn test_update_quantity() {
        let mut cart = Cart::new();
        let product = test_product("1", 1_000, 5);
        cart.add_item(&product, 1).unwrap();

        cart.update_quantity("1", 4).unwrap();
        assert_eq!(cart.total_quantity(), 4);

        assert!(cart.update_quantity("1", 6).is_err());
        assert!(matches!(
            cart.update_quantity("1", 1000),
            Err(CoreError::QuantityTooLarge { .. })
        ));
        assert!(matches!(
            cart.update_quantity("nope", 1),
            Err(CoreError::ProductNotInCart(_))
        ));

        cart.update_quantity("1", 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add_item(&test_product("1", 1_000, 5), 1).unwrap();
        cart.add_item(&test_product("2", 2_000, 5), 1).unwrap();

        cart.remove_item("1").unwrap();
        assert_eq!(cart.item_count(), 1);
        assert!(cart.remove_item("1").is_err());

        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_line_limit() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_ITEMS {
            cart.add_item(&test_product(&i.to_string(), 100, 1), 1)
                .unwrap();
        }
        assert!(matches!(
            cart.add_item(&test_product("extra", 100, 1), 1),
            Err(CoreError::CartTooLarge { .. })
        ));
    }

    #[test]
    fn test_totals_with_discount() {
        let mut cart = Cart::new();
        cart.add_item(&test_product("1", 50_000, 5), 2).unwrap();

        let totals = cart.totals(5_000);
        assert_eq!(totals.item_count, 1);
        assert_eq!(totals.total_quantity, 2);
        assert_eq!(totals.subtotal_cents, 100_000);
        assert_eq!(totals.discount_cents, 5_000);
        assert_eq!(totals.total_cents, 95_000);
    }
}
