//! # Customer Commands
//!
//! Loyalty member lookup, registration and point redemption.
//!
//! ## Counter Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cashier asks for the mobile number                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  attach_customer(phone) ──found──► session.customer = Some(c)          │
//! │       │                                                                 │
//! │    NOT_FOUND                                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  register_customer(name, phone) ──► attached with 0 points             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  redeem_points(n)  (n >= 100, n <= balance, value <= subtotal)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  checkout() debits the points inside the sale transaction              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::commands::cart::CartResponse;
use crate::error::ApiError;
use crate::state::{CartState, DbState};
use vastra_core::loyalty::check_redemption;
use vastra_core::{price_sale, Customer, CustomerTier};

/// Customer as shown on the counter screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub tier: CustomerTier,
    pub points: i64,
    /// Rupee value of the point balance, in paise.
    pub available_discount_cents: i64,
    pub total_purchases_cents: i64,
    pub visit_count: i64,
}

impl From<&Customer> for CustomerDto {
    fn from(c: &Customer) -> Self {
        CustomerDto {
            id: c.id.clone(),
            name: c.name.clone(),
            phone: c.phone.clone(),
            email: c.email.clone(),
            tier: c.tier,
            points: c.points,
            available_discount_cents: c.available_discount().cents(),
            total_purchases_cents: c.total_purchases_cents,
            visit_count: c.visit_count,
        }
    }
}

/// Profile fields editable from the customer screen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerProfile {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub pincode: String,
    pub birthday: String,
    pub anniversary: String,
    pub tier: Option<CustomerTier>,
    pub notes: String,
}

pub async fn find_customer_by_phone(
    db: &DbState,
    phone: &str,
) -> Result<Option<CustomerDto>, ApiError> {
    debug!(phone = %phone, "find_customer_by_phone command");
    let customer = db.inner().customers().get_by_phone(phone).await?;
    Ok(customer.as_ref().map(CustomerDto::from))
}

pub async fn search_customers(db: &DbState, query: &str) -> Result<Vec<CustomerDto>, ApiError> {
    debug!(query = %query, "search_customers command");
    let customers = db.inner().customers().search(query).await?;
    Ok(customers.iter().map(CustomerDto::from).collect())
}

/// Registers a new member and attaches them to the current sale.
pub async fn register_customer(
    db: &DbState,
    cart: &CartState,
    name: &str,
    phone: &str,
    email: &str,
) -> Result<CartResponse, ApiError> {
    debug!(phone = %phone, "register_customer command");

    let customer = db.inner().customers().create(name, phone, email).await?;
    info!(id = %customer.id, phone = %customer.phone, "Customer registered");

    Ok(cart.with_session_mut(|s| {
        s.attach_customer(customer);
        CartResponse::from(&*s)
    }))
}

/// Updates a member's profile.
pub async fn update_customer(
    db: &DbState,
    id: &str,
    profile: CustomerProfile,
) -> Result<CustomerDto, ApiError> {
    debug!(id = %id, "update_customer command");

    let customers = db.inner().customers();
    let mut customer = customers
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", id))?;

    customer.name = profile.name.trim().to_string();
    customer.phone = profile.phone.trim().to_string();
    customer.email = profile.email.trim().to_string();
    customer.address = profile.address;
    customer.city = profile.city;
    customer.pincode = profile.pincode.trim().to_string();
    customer.birthday = profile.birthday;
    customer.anniversary = profile.anniversary;
    if let Some(tier) = profile.tier {
        customer.tier = tier;
    }
    customer.notes = profile.notes;

    customers.update(&customer).await?;
    Ok(CustomerDto::from(&customer))
}

/// Attaches the member with this phone number to the current sale.
pub async fn attach_customer(
    db: &DbState,
    cart: &CartState,
    phone: &str,
) -> Result<CartResponse, ApiError> {
    debug!(phone = %phone, "attach_customer command");

    let customer = db
        .inner()
        .customers()
        .get_by_phone(phone)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", phone.trim()))?;

    Ok(cart.with_session_mut(|s| {
        s.attach_customer(customer);
        CartResponse::from(&*s)
    }))
}

pub fn detach_customer(cart: &CartState) -> CartResponse {
    debug!("detach_customer command");
    cart.with_session_mut(|s| {
        s.detach_customer();
        CartResponse::from(&*s)
    })
}

/// Sets the points to redeem at checkout. `0` cancels the redemption.
///
/// The balance is re-read from the database. The final check happens
/// inside the sale transaction.
///
/// ## Errors
/// - `VALIDATION_ERROR` - no customer attached
/// - `INSUFFICIENT_POINTS` - below the minimum or above the balance
/// - `BUSINESS_LOGIC` - the discount would exceed the subtotal
/// - `CART_ERROR` - the cart is empty
pub async fn redeem_points(
    db: &DbState,
    cart: &CartState,
    points: i64,
) -> Result<CartResponse, ApiError> {
    debug!(points = points, "redeem_points command");

    let customer_id = cart
        .with_session(|s| s.customer.as_ref().map(|c| c.id.clone()))
        .ok_or_else(|| ApiError::validation("Attach a customer before redeeming points"))?;

    if points == 0 {
        return Ok(cart.with_session_mut(|s| {
            s.redeem_points = 0;
            CartResponse::from(&*s)
        }));
    }

    let customer = db
        .inner()
        .customers()
        .get_by_id(&customer_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", &customer_id))?;

    check_redemption(&customer.name, customer.points, points)?;

    cart.with_session_mut(|s| {
        price_sale(&s.cart.items, s.discount_cents, points)?;
        s.redeem_points = points;
        s.customer = Some(customer);
        Ok::<CartResponse, ApiError>(CartResponse::from(&*s))
    })
}
