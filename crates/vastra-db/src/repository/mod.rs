//! # Repository Module
//!
//! Database repository implementations for Vastra POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Service command                                                       │
//! │       │                                                                 │
//! │       │  db.products().find_by_code("8901234567890")                   │
//! │       ▼                                                                 │
//! │  ProductRepository / CustomerRepository / SaleRepository               │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Statements that must also run inside a transaction are written as     │
//! │  `*_on(conn, ..)` functions taking `&mut SqliteConnection`; the        │
//! │  public methods acquire a pooled connection and delegate.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD, lookup and stock
//! - [`customer::CustomerRepository`] - Loyalty members and points
//! - [`sale::SaleRepository`] - Sale completion, void and reports

pub mod customer;
pub mod product;
pub mod sale;

/// Maps an empty string to `None` so optional UNIQUE columns stay NULL.
pub(crate) fn non_empty(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Escapes `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
pub(crate) mod test_support {
    use vastra_core::{Customer, Product};

    use crate::{Database, DbConfig};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn product(sku: &str, price_cents: i64, stock: i64) -> Product {
        let mut p = Product::new(format!("Product {}", sku), price_cents);
        p.sku = sku.to_string();
        p.stock = stock;
        p
    }

    pub async fn insert_product(db: &Database, sku: &str, price_cents: i64, stock: i64) -> Product {
        db.products()
            .insert(&product(sku, price_cents, stock))
            .await
            .unwrap()
    }

    pub async fn insert_customer(db: &Database, phone: &str, points: i64) -> Customer {
        let customer = db
            .customers()
            .create("Test Customer", phone, "")
            .await
            .unwrap();
        if points > 0 {
            db.customers().add_points(&customer.id, points).await.unwrap();
        }
        db.customers().get_by_id(&customer.id).await.unwrap().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty("  "), None);
        assert_eq!(non_empty("SKU-1"), Some("SKU-1"));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("kurta"), "%kurta%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
