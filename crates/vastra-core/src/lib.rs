//! # vastra-core: Pure Business Logic for Vastra POS
//!
//! This crate contains the domain model and every calculation the store
//! performs, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vastra POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/pos (Service Layer)                        │   │
//! │  │    scan_product, add_to_cart, redeem_points, checkout, ...      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vastra-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   types     money     cart      checkout  loyalty  receipt      │   │
//! │  │   Product   Money     Cart      pricing   points   thermal      │   │
//! │  │   Customer  GST       CartItem  totals    tiers    layout       │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    vastra-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, Sale, SaleItem)
//! - [`money`] - Money type with integer arithmetic and GST extraction
//! - [`cart`] - Cart lines and cart totals
//! - [`checkout`] - Sale pricing (subtotal, discount, redemption, total)
//! - [`loyalty`] - Point accrual and redemption rules
//! - [`receipt`] - Fixed-width thermal receipt and label layout
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use vastra_core::money::Money;
//!
//! // ₹1,180.00 including 18% GST
//! let price = Money::from_cents(118_000);
//! let gst = price.inclusive_tax(18);
//! assert_eq!(gst.cents(), 18_000);
//! ```

pub mod cart;
pub mod checkout;
pub mod error;
pub mod loyalty;
pub mod money;
pub mod receipt;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem, CartTotals};
pub use checkout::{price_sale, SalePricing};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in the cart.
///
/// Catches typing 1000 instead of 10 at the counter.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Unit of measure used when a product has none recorded.
pub const DEFAULT_UNIT: &str = "PCS";

/// Reorder threshold given to new products.
pub const DEFAULT_REORDER_THRESHOLD: i64 = 5;
