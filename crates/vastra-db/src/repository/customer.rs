//! # Customer Repository
//!
//! Loyalty members: registration, lookup by phone, and point balances.
//!
//! Point changes use the same guarded-update pattern as stock:
//! `points = points - n WHERE points >= n`, so a balance never goes
//! negative even if two screens redeem at once.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{like_pattern, non_empty};
use vastra_core::types::now_timestamp;
use vastra_core::validation::{
    validate_customer_name, validate_email, validate_phone, validate_pincode, validate_points,
    validate_search_query,
};
use vastra_core::{CoreError, Customer, CustomerTier};

const CUSTOMER_COLUMNS: &str = "id, name, phone, email, address, city, pincode, birthday, \
     anniversary, points, total_purchases_cents, visit_count, tier, notes, is_active, \
     created_at, last_visit";

/// Maximum rows returned by [`CustomerRepository::search`].
const SEARCH_LIMIT: i64 = 50;

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    phone: String,
    email: Option<String>,
    address: Option<String>,
    city: Option<String>,
    pincode: Option<String>,
    birthday: Option<String>,
    anniversary: Option<String>,
    points: i64,
    total_purchases_cents: i64,
    visit_count: i64,
    tier: CustomerTier,
    notes: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    last_visit: Option<DateTime<Utc>>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email.unwrap_or_default(),
            address: row.address.unwrap_or_default(),
            city: row.city.unwrap_or_default(),
            pincode: row.pincode.unwrap_or_default(),
            birthday: row.birthday.unwrap_or_default(),
            anniversary: row.anniversary.unwrap_or_default(),
            points: row.points,
            total_purchases_cents: row.total_purchases_cents,
            visit_count: row.visit_count,
            tier: row.tier,
            notes: row.notes.unwrap_or_default(),
            is_active: row.is_active,
            created_at: row.created_at,
            last_visit: row.last_visit,
        }
    }
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Registers a customer at the counter.
    ///
    /// ## Returns
    /// * `Ok(Customer)` - New customer with zero points, tier BRONZE
    /// * `Err(DbError::UniqueViolation)` - Phone already registered
    pub async fn create(&self, name: &str, phone: &str, email: &str) -> DbResult<Customer> {
        let mut customer = Customer::new(name.trim(), phone.trim());
        customer.email = email.trim().to_string();
        self.insert(&customer).await
    }

    /// Inserts a fully populated customer.
    pub async fn insert(&self, customer: &Customer) -> DbResult<Customer> {
        validate_customer(customer)?;

        debug!(id = %customer.id, phone = %customer.phone, "Inserting customer");

        if self.get_by_phone(&customer.phone).await?.is_some() {
            return Err(DbError::duplicate("phone", &customer.phone));
        }

        let sql = format!(
            "INSERT INTO customers ({}) VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            CUSTOMER_COLUMNS
        );

        sqlx::query(&sql)
            .bind(&customer.id)
            .bind(&customer.name)
            .bind(&customer.phone)
            .bind(non_empty(&customer.email))
            .bind(non_empty(&customer.address))
            .bind(non_empty(&customer.city))
            .bind(non_empty(&customer.pincode))
            .bind(non_empty(&customer.birthday))
            .bind(non_empty(&customer.anniversary))
            .bind(customer.points)
            .bind(customer.total_purchases_cents)
            .bind(customer.visit_count)
            .bind(customer.tier)
            .bind(non_empty(&customer.notes))
            .bind(customer.is_active)
            .bind(customer.created_at)
            .bind(customer.last_visit)
            .execute(&self.pool)
            .await?;

        Ok(customer.clone())
    }

    /// Updates profile fields. Points and purchase totals are left alone.
    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        validate_customer(customer)?;

        debug!(id = %customer.id, "Updating customer");

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2,
                phone = ?3,
                email = ?4,
                address = ?5,
                city = ?6,
                pincode = ?7,
                birthday = ?8,
                anniversary = ?9,
                tier = ?10,
                notes = ?11,
                is_active = ?12
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(non_empty(&customer.email))
        .bind(non_empty(&customer.address))
        .bind(non_empty(&customer.city))
        .bind(non_empty(&customer.pincode))
        .bind(non_empty(&customer.birthday))
        .bind(non_empty(&customer.anniversary))
        .bind(customer.tier)
        .bind(non_empty(&customer.notes))
        .bind(customer.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("phone", &customer.phone),
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        fetch_on(&mut conn, id).await
    }

    /// Looks up a customer by mobile number.
    pub async fn get_by_phone(&self, phone: &str) -> DbResult<Option<Customer>> {
        let phone = phone.trim();
        debug!(phone = %phone, "Looking up customer by phone");

        let sql = format!("SELECT {} FROM customers WHERE phone = ?1", CUSTOMER_COLUMNS);
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Customer::from))
    }

    /// Active customers whose name or phone contains `query`.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Customer>> {
        let query = validate_search_query(query)?;

        debug!(query = %query, "Searching customers");

        let sql = format!(
            "SELECT {} FROM customers \
             WHERE is_active = 1 AND (name LIKE ?1 ESCAPE '\\' OR phone LIKE ?1 ESCAPE '\\') \
             ORDER BY name LIMIT ?2",
            CUSTOMER_COLUMNS
        );

        let rows = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(like_pattern(&query))
            .bind(SEARCH_LIMIT)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Customer::from).collect())
    }

    /// Credits points. Returns the new balance.
    pub async fn add_points(&self, id: &str, points: i64) -> DbResult<i64> {
        validate_points(points)?;
        let mut conn = self.pool.acquire().await?;
        add_points_on(&mut conn, id, points).await
    }

    /// Debits points if the balance covers them. Returns the new balance.
    ///
    /// ## Errors
    /// - `Domain(InsufficientPoints)` - balance too low, nothing changed
    /// - `NotFound` - no such customer
    pub async fn redeem_points(&self, id: &str, points: i64) -> DbResult<i64> {
        validate_points(points)?;
        let mut conn = self.pool.acquire().await?;
        redeem_points_on(&mut conn, id, points).await
    }

    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn validate_customer(customer: &Customer) -> DbResult<()> {
    validate_customer_name(&customer.name)?;
    validate_phone(&customer.phone)?;
    validate_email(&customer.email)?;
    validate_pincode(&customer.pincode)?;
    Ok(())
}

// =============================================================================
// Connection-level statements (shared with the sale transaction)
// =============================================================================

pub(crate) async fn fetch_on(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Customer>> {
    let sql = format!("SELECT {} FROM customers WHERE id = ?1", CUSTOMER_COLUMNS);
    let row = sqlx::query_as::<_, CustomerRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(Customer::from))
}

async fn balance_on(conn: &mut SqliteConnection, id: &str) -> DbResult<i64> {
    let points: i64 = sqlx::query_scalar("SELECT points FROM customers WHERE id = ?1")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(points)
}

pub(crate) async fn add_points_on(
    conn: &mut SqliteConnection,
    id: &str,
    points: i64,
) -> DbResult<i64> {
    debug!(id = %id, points = points, "Adding points");

    let result = sqlx::query("UPDATE customers SET points = points + ?2 WHERE id = ?1")
        .bind(id)
        .bind(points)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Customer", id));
    }

    balance_on(conn, id).await
}

/// Guarded debit: `points = points - n WHERE points >= n`.
pub(crate) async fn redeem_points_on(
    conn: &mut SqliteConnection,
    id: &str,
    points: i64,
) -> DbResult<i64> {
    debug!(id = %id, points = points, "Redeeming points");

    let result =
        sqlx::query("UPDATE customers SET points = points - ?2 WHERE id = ?1 AND points >= ?2")
            .bind(id)
            .bind(points)
            .execute(&mut *conn)
            .await?;

    if result.rows_affected() == 0 {
        return Err(match fetch_on(conn, id).await? {
            Some(customer) => CoreError::InsufficientPoints {
                customer: customer.name,
                available: customer.points,
                requested: points,
            }
            .into(),
            None => DbError::not_found("Customer", id),
        });
    }

    balance_on(conn, id).await
}

/// Records a completed purchase: points, spend, visit count, last visit.
pub(crate) async fn record_purchase_on(
    conn: &mut SqliteConnection,
    id: &str,
    total_cents: i64,
    points_earned: i64,
    at: DateTime<Utc>,
) -> DbResult<()> {
    debug!(id = %id, total_cents = total_cents, points_earned = points_earned, "Recording purchase");

    let result = sqlx::query(
        r#"
        UPDATE customers SET
            points = points + ?2,
            total_purchases_cents = total_purchases_cents + ?3,
            visit_count = visit_count + 1,
            last_visit = ?4
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(points_earned)
    .bind(total_cents)
    .bind(at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Customer", id));
    }

    Ok(())
}

/// Undoes [`record_purchase_on`] for spend and visit count.
///
/// Points are handled separately by the caller so the net change can be
/// guarded against a negative balance.
pub(crate) async fn reverse_purchase_on(
    conn: &mut SqliteConnection,
    id: &str,
    total_cents: i64,
) -> DbResult<()> {
    debug!(id = %id, total_cents = total_cents, "Reversing purchase");

    let result = sqlx::query(
        r#"
        UPDATE customers SET
            total_purchases_cents = MAX(total_purchases_cents - ?2, 0),
            visit_count = MAX(visit_count - 1, 0)
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(total_cents)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Customer", id));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{insert_customer, test_db};
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = test_db().await;
        let created = db
            .customers()
            .create("Asha Verma", " 9876543210 ", "asha@example.in")
            .await
            .unwrap();

        assert_eq!(created.points, 0);
        assert_eq!(created.tier, CustomerTier::Bronze);

        let by_phone = db.customers().get_by_phone("9876543210").await.unwrap().unwrap();
        assert_eq!(by_phone, created);
        assert_eq!(by_phone.address, "");

        let by_id = db.customers().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "asha@example.in");
    }

    #[tokio::test]
    async fn test_duplicate_phone_rejected() {
        let db = test_db().await;
        insert_customer(&db, "9876543210", 0).await;

        let err = db
            .customers()
            .create("Someone Else", "9876543210", "")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_invalid_phone_rejected() {
        let db = test_db().await;
        assert!(matches!(
            db.customers().create("Ravi", "12ab", "").await,
            Err(DbError::Domain(CoreError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_search_by_name_or_phone() {
        let db = test_db().await;
        db.customers().create("Asha Verma", "9876543210", "").await.unwrap();
        db.customers().create("Ravi Kumar", "9123456780", "").await.unwrap();

        assert_eq!(db.customers().search("asha").await.unwrap().len(), 1);
        assert_eq!(db.customers().search("912345").await.unwrap().len(), 1);
        assert_eq!(db.customers().search("").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_profile_and_tier() {
        let db = test_db().await;
        let mut c = insert_customer(&db, "9876543210", 0).await;

        c.city = "Jaipur".to_string();
        c.tier = CustomerTier::Gold;
        db.customers().update(&c).await.unwrap();

        let fetched = db.customers().get_by_id(&c.id).await.unwrap().unwrap();
        assert_eq!(fetched.city, "Jaipur");
        assert_eq!(fetched.tier, CustomerTier::Gold);
    }

    #[tokio::test]
    async fn test_add_and_redeem_points() {
        let db = test_db().await;
        let c = insert_customer(&db, "9876543210", 0).await;

        assert_eq!(db.customers().add_points(&c.id, 150).await.unwrap(), 150);
        assert_eq!(db.customers().redeem_points(&c.id, 100).await.unwrap(), 50);

        let err = db.customers().redeem_points(&c.id, 60).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientPoints {
                available: 50,
                requested: 60,
                ..
            })
        ));

        assert!(db
            .customers()
            .redeem_points("missing", 1)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(db.customers().add_points(&c.id, 0).await.is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_over_redemption_leaves_balance_unchanged(
            balance in 1i64..5_000,
            extra in 1i64..5_000,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let db = test_db().await;
                let c = insert_customer(&db, "9876543210", balance).await;

                let result = db.customers().redeem_points(&c.id, balance + extra).await;
                assert!(matches!(
                    result,
                    Err(DbError::Domain(CoreError::InsufficientPoints { .. }))
                ));

                let after = db.customers().get_by_id(&c.id).await.unwrap().unwrap();
                assert_eq!(after.points, balance);
            });
        }
    }
}
