//! # Domain Types
//!
//! Core domain types used throughout Vastra POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Customer     │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku / barcode  │   │  phone (unique) │   │  invoice_number │       │
//! │  │  sell_price     │   │  points         │   │  total_cents    │       │
//! │  │  gst_percent    │   │  tier           │   │  status         │       │
//! │  │  stock          │   │  visit_count    │   │  payment_mode   │       │
//! │  └─────────────────┘   └─────────────────┘   └────────┬────────┘       │
//! │                                                        │ 1..n           │
//! │                                               ┌────────▼────────┐       │
//! │                                               │    SaleItem     │       │
//! │                                               │  (snapshot of   │       │
//! │                                               │   the product)  │       │
//! │                                               └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (sku, barcode, phone, invoice_number) - human-readable

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;
use crate::{DEFAULT_REORDER_THRESHOLD, DEFAULT_UNIT};

/// Current time truncated to whole seconds.
///
/// Timestamps are persisted as RFC 3339 text; whole seconds keep them
/// readable and make a stored value compare equal to the one written.
pub fn now_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Generates a new entity id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Product
// =============================================================================

/// A garment or accessory on the shelf.
///
/// Text fields that are optional in the database are plain `String`s here
/// and read back as `""` when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Size / colour variant, e.g. "M / Blue".
    pub variant: String,

    pub category: String,
    pub brand: String,

    /// Printed barcode (Code 128 / EAN).
    pub barcode: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Maximum retail price in paise.
    pub mrp_cents: i64,

    /// Selling price in paise, GST inclusive.
    pub sell_price_cents: i64,

    /// Purchase cost in paise (for margin reports).
    pub purchase_price_cents: i64,

    /// GST slab in whole percent (0, 5, 12, 18, 28).
    pub gst_percent: i64,

    /// HSN code printed on GST invoices.
    pub hsn_code: String,

    /// Units on the shelf. Never negative.
    pub stock: i64,

    /// At or below this count the product shows up as low stock.
    pub reorder_threshold: i64,

    /// Unit of measure, `PCS` by default.
    pub unit: String,

    pub description: String,
    pub image_path: String,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates an active product with a fresh id and default fields.
    ///
    /// ## Example
    /// ```rust
    /// use vastra_core::Product;
    ///
    /// let mut shirt = Product::new("Linen Shirt", 149_900);
    /// shirt.variant = "L".to_string();
    /// assert_eq!(shirt.display_name(), "Linen Shirt - L");
    /// assert_eq!(shirt.unit, "PCS");
    /// ```
    pub fn new(name: impl Into<String>, sell_price_cents: i64) -> Self {
        let now = now_timestamp();
        Product {
            id: new_id(),
            name: name.into(),
            variant: String::new(),
            category: String::new(),
            brand: String::new(),
            barcode: String::new(),
            sku: String::new(),
            mrp_cents: sell_price_cents,
            sell_price_cents,
            purchase_price_cents: 0,
            gst_percent: 0,
            hsn_code: String::new(),
            stock: 0,
            reorder_threshold: DEFAULT_REORDER_THRESHOLD,
            unit: DEFAULT_UNIT.to_string(),
            description: String::new(),
            image_path: String::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    pub fn mrp(&self) -> Money {
        Money::from_cents(self.mrp_cents)
    }

    #[inline]
    pub fn sell_price(&self) -> Money {
        Money::from_cents(self.sell_price_cents)
    }

    #[inline]
    pub fn purchase_price(&self) -> Money {
        Money::from_cents(self.purchase_price_cents)
    }

    /// `name - variant`, or just `name` when there is no variant.
    pub fn display_name(&self) -> String {
        if self.variant.is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", self.name, self.variant)
        }
    }

    /// Display name with the brand in parentheses when known.
    pub fn full_display_name(&self) -> String {
        let mut name = self.display_name();
        if !self.brand.is_empty() {
            name.push_str(&format!(" ({})", self.brand));
        }
        name
    }

    /// Selling price × quantity.
    pub fn line_total(&self, quantity: i64) -> Money {
        self.sell_price().multiply_quantity(quantity)
    }

    /// GST contained in `quantity` units at the selling price.
    pub fn tax_amount(&self, quantity: i64) -> Money {
        self.line_total(quantity).inclusive_tax(self.gst_percent)
    }

    /// Profit per unit (selling − purchase).
    pub fn profit_amount(&self) -> Money {
        self.sell_price() - self.purchase_price()
    }

    /// Margin over purchase price, in percent (display only).
    pub fn profit_margin_percent(&self) -> f64 {
        if self.purchase_price_cents == 0 {
            return 0.0;
        }
        (self.sell_price_cents - self.purchase_price_cents) as f64 * 100.0
            / self.purchase_price_cents as f64
    }

    /// Difference between MRP and selling price.
    pub fn savings(&self) -> Money {
        self.mrp() - self.sell_price()
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.reorder_threshold
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.stock == 0
    }
}

// =============================================================================
// Customer Tier
// =============================================================================

/// Loyalty tier label. Display only; no business rule depends on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum CustomerTier {
    #[default]
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl CustomerTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerTier::Bronze => "BRONZE",
            CustomerTier::Silver => "SILVER",
            CustomerTier::Gold => "GOLD",
            CustomerTier::Platinum => "PLATINUM",
        }
    }
}

impl fmt::Display for CustomerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomerTier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BRONZE" => Ok(CustomerTier::Bronze),
            "SILVER" => Ok(CustomerTier::Silver),
            "GOLD" => Ok(CustomerTier::Gold),
            "PLATINUM" => Ok(CustomerTier::Platinum),
            _ => Err(ValidationError::NotAllowed {
                field: "tier".to_string(),
                allowed: ["BRONZE", "SILVER", "GOLD", "PLATINUM"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A loyalty-program member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,

    /// Mobile number, unique per customer. Used for lookup at the counter.
    pub phone: String,

    pub email: String,
    pub address: String,
    pub city: String,
    pub pincode: String,
    pub birthday: String,
    pub anniversary: String,

    /// Loyalty point balance. Never negative.
    pub points: i64,

    /// Lifetime spend in paise.
    pub total_purchases_cents: i64,

    pub visit_count: i64,
    pub tier: CustomerTier,
    pub notes: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_visit: Option<DateTime<Utc>>,
}

impl Customer {
    /// Creates an active customer with zero points.
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Customer {
            id: new_id(),
            name: name.into(),
            phone: phone.into(),
            email: String::new(),
            address: String::new(),
            city: String::new(),
            pincode: String::new(),
            birthday: String::new(),
            anniversary: String::new(),
            points: 0,
            total_purchases_cents: 0,
            visit_count: 0,
            tier: CustomerTier::default(),
            notes: String::new(),
            is_active: true,
            created_at: now_timestamp(),
            last_visit: None,
        }
    }

    /// Discount the current balance is worth (1 point = ₹1).
    pub fn available_discount(&self) -> Money {
        crate::loyalty::redemption_value(self.points)
    }

    pub fn total_purchases(&self) -> Money {
        Money::from_cents(self.total_purchases_cents)
    }

    /// `address, city - pincode`, skipping empty parts.
    pub fn full_address(&self) -> String {
        let mut out = String::new();
        if !self.address.is_empty() {
            out.push_str(&self.address);
        }
        if !self.city.is_empty() {
            if !out.is_empty() {
                out.push_str(", ");
            }
            out.push_str(&self.city);
        }
        if !self.pincode.is_empty() {
            if !out.is_empty() {
                out.push_str(" - ");
            }
            out.push_str(&self.pincode);
        }
        out
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a recorded sale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum SaleStatus {
    /// Paid and persisted with its stock and loyalty effects.
    #[default]
    Completed,
    /// Cancelled; stock and points have been restored.
    Voided,
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaleStatus::Completed => f.write_str("COMPLETED"),
            SaleStatus::Voided => f.write_str("VOIDED"),
        }
    }
}

// =============================================================================
// Payment Mode
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMode {
    Cash,
    /// Card swiped on an external terminal.
    Card,
    Upi,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "CASH",
            PaymentMode::Card => "CARD",
            PaymentMode::Upi => "UPI",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMode::Cash),
            "card" | "credit" | "debit" => Ok(PaymentMode::Card),
            "upi" => Ok(PaymentMode::Upi),
            _ => Err(ValidationError::NotAllowed {
                field: "payment mode".to_string(),
                allowed: vec!["CASH".into(), "CARD".into(), "UPI".into()],
            }),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub invoice_number: String,
    pub customer_id: Option<String>,
    /// When the sale was rung up.
    pub ts: DateTime<Utc>,
    pub subtotal_cents: i64,
    /// GST contained in the subtotal (informational; prices are inclusive).
    pub tax_cents: i64,
    /// Manual discount plus the value of redeemed points.
    pub discount_cents: i64,
    pub total_cents: i64,
    pub points_earned: i64,
    pub points_redeemed: i64,
    pub payment_mode: PaymentMode,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    /// Variant at time of sale (frozen).
    pub product_variant: String,
    pub sku: String,
    pub qty: i64,
    /// Unit price in paise at time of sale (frozen).
    pub unit_price_cents: i64,
    pub tax_percent: i64,
    pub tax_cents: i64,
    pub line_total_cents: i64,
}

impl SaleItem {
    pub fn display_name(&self) -> String {
        if self.product_variant.is_empty() {
            self.product_name.clone()
        } else {
            format!("{} - {}", self.product_name, self.product_variant)
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
