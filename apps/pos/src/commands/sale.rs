//! # Sale Commands
//!
//! Checkout, void and receipt reprint.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  checkout("upi")                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  snapshot session (lock released before any .await)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SaleRepository::complete_sale ── one transaction, all or nothing      │
//! │       │                       │                                         │
//! │       │ Ok                    │ Err ─► session untouched, error shown  │
//! │       ▼                                                                 │
//! │  reset session, render receipt with the customer's new balance         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{CartState, ConfigState, DbState};
use vastra_core::{Customer, PaymentMode, Sale, SaleItem};
use vastra_db::CompletedSale;

/// Result of a completed checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    /// Thermal receipt text, ready for the printer.
    pub receipt_text: String,
}

/// Completes the current sale.
///
/// On success the session is reset for the next customer. On failure
/// nothing is written and the cart stays as it was, so the cashier can
/// fix the quantity and retry.
pub async fn checkout(
    db: &DbState,
    cart: &CartState,
    config: &ConfigState,
    payment_mode: &str,
) -> Result<CheckoutResponse, ApiError> {
    debug!(payment_mode = %payment_mode, "checkout command");

    let payment_mode: PaymentMode = payment_mode.parse()?;
    let request = cart.with_session(|s| s.to_request(payment_mode));

    let CompletedSale { sale, items } = db.inner().sales().complete_sale(&request).await?;

    cart.with_session_mut(|s| s.reset());

    let customer = load_customer(db, sale.customer_id.as_deref()).await?;
    let receipt_text = config
        .receipt_layout()
        .render_receipt(&sale, &items, customer.as_ref());

    info!(
        invoice = %sale.invoice_number,
        total = %config.format_currency(sale.total_cents),
        "Checkout complete"
    );

    Ok(CheckoutResponse {
        sale,
        items,
        receipt_text,
    })
}

/// Voids a completed sale, restoring stock and points.
pub async fn void_sale(db: &DbState, sale_id: &str) -> Result<Sale, ApiError> {
    debug!(sale_id = %sale_id, "void_sale command");
    let sale = db.inner().sales().void_sale(sale_id).await?;
    info!(invoice = %sale.invoice_number, "Sale voided");
    Ok(sale)
}

/// Sale header and items by id.
pub async fn get_sale(db: &DbState, sale_id: &str) -> Result<CompletedSale, ApiError> {
    debug!(sale_id = %sale_id, "get_sale command");
    db.inner()
        .sales()
        .get_with_items(sale_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", sale_id))
}

/// Looks a sale up by the invoice number printed on the receipt.
pub async fn find_sale_by_invoice(
    db: &DbState,
    invoice_number: &str,
) -> Result<CompletedSale, ApiError> {
    debug!(invoice = %invoice_number, "find_sale_by_invoice command");

    let sales = db.inner().sales();
    let sale = sales
        .get_by_invoice_number(invoice_number.trim())
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", invoice_number.trim()))?;
    let items = sales.get_items(&sale.id).await?;
    Ok(CompletedSale { sale, items })
}

/// Re-renders the receipt of an earlier sale.
pub async fn get_receipt(
    db: &DbState,
    config: &ConfigState,
    sale_id: &str,
) -> Result<String, ApiError> {
    debug!(sale_id = %sale_id, "get_receipt command");

    let CompletedSale { sale, items } = get_sale(db, sale_id).await?;
    let customer = load_customer(db, sale.customer_id.as_deref()).await?;

    Ok(config
        .receipt_layout()
        .render_receipt(&sale, &items, customer.as_ref()))
}

async fn load_customer(db: &DbState, id: Option<&str>) -> Result<Option<Customer>, ApiError> {
    match id {
        Some(id) => Ok(db.inner().customers().get_by_id(id).await?),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::{add_to_cart, get_cart, set_discount};
    use crate::commands::customer::{attach_customer, redeem_points};
    use crate::commands::test_support::{member, stocked_product, test_app};
    use crate::error::ErrorCode;
    use vastra_core::SaleStatus;

    #[tokio::test]
    async fn test_walk_in_checkout() {
        let app = test_app().await;
        let product = stocked_product(&app, "SHIRT-L-2", 89_900, 3).await;
        add_to_cart(&app.db, &app.cart, &product.id, Some(2))
            .await
            .unwrap();

        let done = checkout(&app.db, &app.cart, &app.config, "cash")
            .await
            .unwrap();

        assert_eq!(done.sale.total_cents, 179_800);
        assert_eq!(done.sale.points_earned, 0);
        assert_eq!(done.items.len(), 1);
        assert!(done.receipt_text.contains(&done.sale.invoice_number));
        assert!(done.receipt_text.contains("Walk-in"));
        assert!(get_cart(&app.cart).items.is_empty());

        let stock = app
            .db
            .inner()
            .products()
            .get_by_id(&product.id)
            .await
            .unwrap()
            .unwrap()
            .stock;
        assert_eq!(stock, 1);
    }

    #[tokio::test]
    async fn test_member_checkout_with_redemption() {
        let app = test_app().await;
        let product = stocked_product(&app, "KURTA-XL-1", 250_000, 2).await;
        member(&app, "9876512345", 150).await;

        attach_customer(&app.db, &app.cart, "9876512345").await.unwrap();
        add_to_cart(&app.db, &app.cart, &product.id, None)
            .await
            .unwrap();
        set_discount(&app.cart, 10_000).unwrap();
        redeem_points(&app.db, &app.cart, 100).await.unwrap();

        let done = checkout(&app.db, &app.cart, &app.config, "upi")
            .await
            .unwrap();

        // 2500.00 - 100.00 discount - 100.00 redeemed
        assert_eq!(done.sale.discount_cents, 20_000);
        assert_eq!(done.sale.total_cents, 230_000);
        assert_eq!(done.sale.points_redeemed, 100);
        assert_eq!(done.sale.points_earned, 23);
        assert_eq!(done.sale.payment_mode, PaymentMode::Upi);
        assert!(done.receipt_text.contains("Points Earned"));

        let customer = app
            .db
            .inner()
            .customers()
            .get_by_phone("9876512345")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(customer.points, 73);
        assert_eq!(customer.visit_count, 1);
    }

    #[tokio::test]
    async fn test_failed_checkout_keeps_cart() {
        let app = test_app().await;
        let product = stocked_product(&app, "SAREE-2", 249_900, 2).await;
        add_to_cart(&app.db, &app.cart, &product.id, Some(2))
            .await
            .unwrap();

        // Someone else sold one in the meantime
        app.db
            .inner()
            .products()
            .decrement_stock(&product.id, 1)
            .await
            .unwrap();

        let err = checkout(&app.db, &app.cart, &app.config, "card")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(get_cart(&app.cart).items.len(), 1);

        let today = app
            .db
            .inner()
            .sales()
            .list_for_date(chrono::Utc::now().date_naive())
            .await
            .unwrap();
        assert!(today.is_empty());
    }

    #[tokio::test]
    async fn test_checkout_rejects_bad_input() {
        let app = test_app().await;

        let err = checkout(&app.db, &app.cart, &app.config, "cash")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);

        let err = checkout(&app.db, &app.cart, &app.config, "cheque")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_void_and_reprint() {
        let app = test_app().await;
        let product = stocked_product(&app, "JEANS-34", 149_900, 2).await;
        add_to_cart(&app.db, &app.cart, &product.id, None)
            .await
            .unwrap();
        let done = checkout(&app.db, &app.cart, &app.config, "cash")
            .await
            .unwrap();

        let voided = void_sale(&app.db, &done.sale.id).await.unwrap();
        assert_eq!(voided.status, SaleStatus::Voided);

        let err = void_sale(&app.db, &done.sale.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        let receipt = get_receipt(&app.db, &app.config, &done.sale.id)
            .await
            .unwrap();
        assert!(receipt.contains("VOIDED"));

        let found = find_sale_by_invoice(&app.db, &done.sale.invoice_number)
            .await
            .unwrap();
        assert_eq!(found.sale.id, done.sale.id);
        assert_eq!(found.items.len(), 1);

        let err = get_sale(&app.db, "missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
