//! # Commands Module
//!
//! One async function per action at the counter.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports)
//! ├── product.rs   ◄─── Search, scan, catalog edits, restock, labels
//! ├── customer.rs  ◄─── Lookup, registration, attach, redeem
//! ├── cart.rs      ◄─── Cart manipulation and discount
//! ├── sale.rs      ◄─── Checkout, void, receipt reprint
//! └── report.rs    ◄─── Daily report, range summary, stock alerts
//! ```
//!
//! ## State Injection
//! Each command declares only the state it needs:
//! ```rust,ignore
//! // Only needs database
//! async fn search_products(db: &DbState, ..)
//!
//! // Only needs the session
//! fn get_cart(cart: &CartState)
//!
//! // Needs both
//! async fn add_to_cart(db: &DbState, cart: &CartState, ..)
//! ```

pub mod cart;
pub mod customer;
pub mod product;
pub mod report;
pub mod sale;

#[cfg(test)]
pub(crate) mod test_support {
    use vastra_core::{Customer, Product};
    use vastra_db::DbConfig;

    use crate::state::ConfigState;
    use crate::{bootstrap_with, App};

    pub async fn test_app() -> App {
        bootstrap_with(ConfigState::default(), DbConfig::in_memory())
            .await
            .unwrap()
    }

    pub async fn stocked_product(app: &App, sku: &str, price_cents: i64, stock: i64) -> Product {
        let mut product = Product::new(format!("Garment {}", sku), price_cents);
        product.sku = sku.to_string();
        product.barcode = format!("BC{}", sku);
        product.stock = stock;
        product.gst_percent = 5;
        app.db.inner().products().insert(&product).await.unwrap()
    }

    pub async fn member(app: &App, phone: &str, points: i64) -> Customer {
        let customers = app.db.inner().customers();
        let customer = customers.create("Asha Rao", phone, "").await.unwrap();
        if points > 0 {
            customers.add_points(&customer.id, points).await.unwrap();
        }
        customers.get_by_id(&customer.id).await.unwrap().unwrap()
    }
}
