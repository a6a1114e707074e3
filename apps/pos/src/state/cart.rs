//! # Cart State
//!
//! The in-progress sale at the counter: cart lines plus the attached
//! customer, manual discount and pending point redemption.
//!
//! ## Session Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Session State Operations                             │
//! │                                                                         │
//! │  Counter Action           Command                 Session Change        │
//! │  ──────────────           ───────                 ──────────────        │
//! │                                                                         │
//! │  Scan barcode ───────────► scan_to_cart() ──────► cart.add_item()      │
//! │                                                                         │
//! │  Change Quantity ────────► update_cart_item() ──► items[i].qty = n     │
//! │                                                                         │
//! │  Enter phone ────────────► attach_customer() ───► customer = Some(c)   │
//! │                                                                         │
//! │  Redeem ─────────────────► redeem_points() ─────► redeem_points = n    │
//! │                                                                         │
//! │  Pay ────────────────────► checkout() ──────────► reset()              │
//! │                                                                         │
//! │  NOTE: The lock is never held across an `.await`.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use vastra_core::loyalty::redemption_value;
use vastra_core::{Cart, CartTotals, Customer, PaymentMode};
use vastra_db::SaleRequest;

/// One customer's visit at the counter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub cart: Cart,

    /// Loyalty member attached to this sale, if any.
    pub customer: Option<Customer>,

    /// Manual discount in paise.
    pub discount_cents: i64,

    /// Points to redeem at checkout (0 for none).
    pub redeem_points: i64,
}

impl Session {
    /// Attaches a customer. Any pending redemption belonged to the
    /// previous customer and is dropped.
    pub fn attach_customer(&mut self, customer: Customer) {
        self.customer = Some(customer);
        self.redeem_points = 0;
    }

    pub fn detach_customer(&mut self) {
        self.customer = None;
        self.redeem_points = 0;
    }

    /// Manual discount plus the value of the pending redemption.
    pub fn total_discount_cents(&self) -> i64 {
        self.discount_cents
            .saturating_add(redemption_value(self.redeem_points).cents())
    }

    pub fn totals(&self) -> CartTotals {
        self.cart.totals(self.total_discount_cents())
    }

    /// Snapshot of the session as a sale request.
    pub fn to_request(&self, payment_mode: PaymentMode) -> SaleRequest {
        SaleRequest {
            lines: self.cart.items.clone(),
            customer_id: self.customer.as_ref().map(|c| c.id.clone()),
            discount_cents: self.discount_cents,
            payment_mode,
            redeem_points: self.redeem_points,
        }
    }

    /// Back to an empty counter.
    pub fn reset(&mut self) {
        self.cart.clear();
        self.customer = None;
        self.discount_cents = 0;
        self.redeem_points = 0;
    }
}

/// Shared session state.
///
/// ## Thread Safety
/// Uses `Arc<Mutex<Session>>`:
/// - `Arc`: Allows shared ownership across tasks
/// - `Mutex`: Ensures only one command modifies the session at a time
///
/// A poisoned lock is recovered, not propagated.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    session: Arc<Mutex<Session>>,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes a function with read access to the session.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let totals = cart_state.with_session(|s| s.totals());
    /// ```
    pub fn with_session<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Session) -> R,
    {
        let session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        f(&session)
    }

    /// Executes a function with write access to the session.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// cart_state.with_session_mut(|s| s.cart.add_item(&product, 1))?;
    /// ```
    pub fn with_session_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vastra_core::Product;

    fn stocked(name: &str, price_cents: i64) -> Product {
        let mut p = Product::new(name, price_cents);
        p.stock = 10;
        p
    }

    #[test]
    fn test_totals_include_redemption() {
        let state = CartState::new();
        state.with_session_mut(|s| {
            s.cart.add_item(&stocked("Kurta", 150_000), 1).unwrap();
            s.discount_cents = 5_000;
            s.redeem_points = 100;
        });

        let totals = state.with_session(|s| s.totals());
        assert_eq!(totals.subtotal_cents, 150_000);
        assert_eq!(totals.discount_cents, 15_000);
        assert_eq!(totals.total_cents, 135_000);
    }

    #[test]
    fn test_attach_drops_pending_redemption() {
        let mut session = Session {
            redeem_points: 200,
            ..Session::default()
        };
        session.attach_customer(Customer::new("Asha", "9876543210"));

        assert_eq!(session.redeem_points, 0);
        assert!(session.customer.is_some());
    }

    #[test]
    fn test_to_request_and_reset() {
        let mut session = Session::default();
        session.cart.add_item(&stocked("Saree", 250_000), 2).unwrap();
        let customer = Customer::new("Asha", "9876543210");
        let customer_id = customer.id.clone();
        session.attach_customer(customer);
        session.discount_cents = 1_000;

        let request = session.to_request(PaymentMode::Upi);
        assert_eq!(request.lines.len(), 1);
        assert_eq!(request.customer_id.as_deref(), Some(customer_id.as_str()));
        assert_eq!(request.discount_cents, 1_000);
        assert_eq!(request.payment_mode, PaymentMode::Upi);

        session.reset();
        assert!(session.cart.is_empty());
        assert!(session.customer.is_none());
        assert_eq!(session.discount_cents, 0);
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let state = CartState::new();
        let clone = state.clone();
        let _ = std::thread::spawn(move || {
            clone.with_session_mut(|s| {
                s.discount_cents = 42;
                panic!("boom");
            })
        })
        .join();

        assert_eq!(state.with_session(|s| s.discount_cents), 42);
    }
}
