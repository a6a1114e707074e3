//! # Error Types
//!
//! Domain-specific error types for vastra-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vastra-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  vastra-db errors (separate crate)                                     │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  apps/pos errors                                                        │
//! │  └── ApiError         - What the cashier sees                          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Dialog       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Messages of `InsufficientStock` and `InsufficientPoints` are shown to
//! the cashier verbatim, so they name the product or customer.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product id, SKU, or barcode did not match anything.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product exists but has been soft-deleted.
    #[error("Product is inactive: {0}")]
    ProductInactive(String),

    /// Customer id or phone did not match anything.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Not enough stock to cover the requested quantity.
    ///
    /// ## When This Occurs
    /// - Adding more to the cart than the shelf count shown on screen
    /// - The stock decrement inside sale completion finds less stock
    ///   than the line needs (the whole sale rolls back)
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Not enough loyalty points to cover a redemption.
    #[error("Insufficient points for {customer}: available {available}, requested {requested}")]
    InsufficientPoints {
        customer: String,
        available: i64,
        requested: i64,
    },

    /// Redemption below the store's minimum.
    #[error("Minimum {min} points required for redemption, requested {requested}")]
    RedemptionBelowMinimum { min: i64, requested: i64 },

    /// Checkout attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Product is not in the cart.
    #[error("Product {0} not in cart")]
    ProductNotInCart(String),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Discount (including redeemed points) larger than the subtotal.
    #[error("Discount {discount} exceeds subtotal {subtotal}")]
    DiscountExceedsSubtotal { discount: i64, subtotal: i64 },

    /// Sale is not in a state that allows the requested operation.
    #[error("Sale {sale_id} is {current_status}, cannot perform operation")]
    InvalidSaleStatus {
        sale_id: String,
        current_status: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, malformed phone).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Cotton Kurta - M".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Cotton Kurta - M: available 3, requested 5"
        );

        let err = CoreError::InsufficientPoints {
            customer: "Asha".to_string(),
            available: 120,
            requested: 150,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient points for Asha: available 120, requested 150"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("phone");
        assert_eq!(err.to_string(), "phone is required");

        let err = ValidationError::TooShort {
            field: "name".to_string(),
            min: 3,
        };
        assert_eq!(err.to_string(), "name must be at least 3 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("sku").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
