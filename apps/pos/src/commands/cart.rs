//! # Cart Commands
//!
//! Commands for cart manipulation.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Customer │────►│ Checkout │       │
//! │  │  Cart    │     │          │     │ + Points │     │  (sale)  │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                                  │             │
//! │                   add_to_cart                        reset session      │
//! │                   scan_to_cart                                          │
//! │                   update_cart_item                                      │
//! │                   remove_from_cart                                      │
//! │                   set_discount                                          │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                   clear_cart ──────────────────────► (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commands::customer::CustomerDto;
use crate::error::ApiError;
use crate::state::{CartState, DbState, Session};
use vastra_core::loyalty::redemption_value;
use vastra_core::validation::validate_discount_cents;
use vastra_core::{CartItem, CartTotals, CoreError, Product};

/// Cart response including items, totals and the attached customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<CartItem>,
    pub totals: CartTotals,
    pub customer: Option<CustomerDto>,
    pub discount_cents: i64,
    pub redeem_points: i64,
}

impl From<&Session> for CartResponse {
    fn from(session: &Session) -> Self {
        CartResponse {
            items: session.cart.items.clone(),
            totals: session.totals(),
            customer: session.customer.as_ref().map(CustomerDto::from),
            discount_cents: session.discount_cents,
            redeem_points: session.redeem_points,
        }
    }
}

/// Gets the current cart contents.
pub fn get_cart(cart: &CartState) -> CartResponse {
    debug!("get_cart command");
    cart.with_session(|s| CartResponse::from(s))
}

fn add_product(cart: &CartState, product: &Product, quantity: i64) -> Result<CartResponse, ApiError> {
    cart.with_session_mut(|s| {
        s.cart.add_item(product, quantity)?;
        Ok::<CartResponse, ApiError>(CartResponse::from(&*s))
    })
}

/// Adds a product to the cart.
///
/// ## Behavior
/// - If product already in cart: quantity increases
/// - If product not in cart: added as new item
/// - Price is "frozen" at time of adding
/// - The current shelf stock is read so the cart never offers more than
///   the shelf holds
pub async fn add_to_cart(
    db: &DbState,
    cart: &CartState,
    product_id: &str,
    quantity: Option<i64>,
) -> Result<CartResponse, ApiError> {
    let quantity = quantity.unwrap_or(1);
    debug!(product_id = %product_id, quantity = quantity, "add_to_cart command");

    let product = db
        .inner()
        .products()
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", product_id))?;

    add_product(cart, &product, quantity)
}

/// Adds one unit of whatever was scanned.
pub async fn scan_to_cart(
    db: &DbState,
    cart: &CartState,
    code: &str,
) -> Result<CartResponse, ApiError> {
    debug!(code = %code, "scan_to_cart command");

    let product = db
        .inner()
        .products()
        .find_by_code(code)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", code.trim()))?;

    add_product(cart, &product, 1)
}

/// Updates the quantity of an item in the cart.
///
/// ## Behavior
/// - Quantity 0: removes the item
/// - Quantity above the stock seen at scan time: `INSUFFICIENT_STOCK`
pub fn update_cart_item(
    cart: &CartState,
    product_id: &str,
    quantity: i64,
) -> Result<CartResponse, ApiError> {
    debug!(product_id = %product_id, quantity = quantity, "update_cart_item command");

    cart.with_session_mut(|s| {
        s.cart.update_quantity(product_id, quantity)?;
        Ok::<CartResponse, ApiError>(CartResponse::from(&*s))
    })
}

pub fn remove_from_cart(cart: &CartState, product_id: &str) -> Result<CartResponse, ApiError> {
    debug!(product_id = %product_id, "remove_from_cart command");

    cart.with_session_mut(|s| {
        s.cart.remove_item(product_id)?;
        Ok::<CartResponse, ApiError>(CartResponse::from(&*s))
    })
}

/// Abandons the sale: empties the cart and drops the customer, discount
/// and redemption.
pub fn clear_cart(cart: &CartState) -> CartResponse {
    debug!("clear_cart command");

    cart.with_session_mut(|s| {
        s.reset();
        CartResponse::from(&*s)
    })
}

/// Sets the manual discount in paise.
///
/// Together with any pending redemption it may not exceed the subtotal.
pub fn set_discount(cart: &CartState, discount_cents: i64) -> Result<CartResponse, ApiError> {
    debug!(discount_cents = discount_cents, "set_discount command");

    validate_discount_cents(discount_cents)?;

    cart.with_session_mut(|s| {
        let subtotal = s.cart.subtotal_cents();
        let discount = discount_cents.saturating_add(redemption_value(s.redeem_points).cents());
        if discount > subtotal {
            return Err(CoreError::DiscountExceedsSubtotal { discount, subtotal }.into());
        }
        s.discount_cents = discount_cents;
        Ok::<CartResponse, ApiError>(CartResponse::from(&*s))
    })
}
