//! # Customer Repository
//!
//! Customers and their denormalised account balance.
//!
//! ## Balance Maintenance
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Any write that changes a job total, a job status, an invoice or a      │
//! │  payment calls recompute_balance() on the SAME transaction:            │
//! │                                                                         │
//! │  UPDATE customers SET account_balance_pence =                           │
//! │        Σ jobs.total       (completed | invoiced)                        │
//! │      + Σ invoices.total   (job_id IS NULL, not void)                    │
//! │      − Σ invoices.paid    (not void)                                    │
//! │                                                                         │
//! │  The stored balance can never lag behind the rows it summarises.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use parlour_core::{Customer, CustomerInput, Money};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{begin_write, clean, like_pattern, new_id};

const CUSTOMER_COLUMNS: &str = r#"
    id, name, contact_name, email, phone, address_line1, address_line2,
    town, postcode, notes, account_balance_pence, created_at, updated_at
"#;

pub(crate) async fn find<'e, E>(executor: E, id: &str) -> DbResult<Option<Customer>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {} FROM customers WHERE id = ?1", CUSTOMER_COLUMNS);
    let customer = sqlx::query_as::<_, Customer>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(customer)
}

pub(crate) async fn require<'e, E>(executor: E, id: &str) -> DbResult<Customer>
where
    E: SqliteExecutor<'e>,
{
    find(executor, id)
        .await?
        .ok_or_else(|| DbError::not_found("Customer", id))
}

/// Recomputes and stores a customer's balance. Run it on the transaction
/// that made the change.
pub(crate) async fn recompute_balance(conn: &mut SqliteConnection, customer_id: &str) -> DbResult<Money> {
    let balance: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE customers SET account_balance_pence =
              COALESCE((SELECT SUM(total_pence) FROM jobs
                         WHERE customer_id = ?1
                           AND status IN ('completed', 'invoiced')), 0)
            + COALESCE((SELECT SUM(total_pence) FROM invoices
                         WHERE customer_id = ?1
                           AND job_id IS NULL
                           AND status != 'void'), 0)
            - COALESCE((SELECT SUM(amount_paid_pence) FROM invoices
                         WHERE customer_id = ?1
                           AND status != 'void'), 0)
        WHERE id = ?1
        RETURNING account_balance_pence
        "#,
    )
    .bind(customer_id)
    .fetch_optional(&mut *conn)
    .await?;

    let balance = balance.ok_or_else(|| DbError::not_found("Customer", customer_id))?;
    debug!(customer_id = %customer_id, balance, "Recomputed account balance");
    Ok(Money::from_pence(balance))
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

    /// Lists customers by name, optionally filtered by a search term that
    /// matches name, contact, email, town or postcode.
    pub async fn list(&self, search: Option<&str>) -> DbResult<Vec<Customer>> {
        let term = search.map(str::trim).filter(|s| !s.is_empty());

        let customers = match term {
            Some(term) => {
                let sql = format!(
                    r#"
                    SELECT {} FROM customers
                    WHERE name LIKE ?1 ESCAPE '\'
                       OR contact_name LIKE ?1 ESCAPE '\'
                       OR email LIKE ?1 ESCAPE '\'
                       OR town LIKE ?1 ESCAPE '\'
                       OR postcode LIKE ?1 ESCAPE '\'
                    ORDER BY name COLLATE NOCASE
                    "#,
                    CUSTOMER_COLUMNS
                );
                sqlx::query_as::<_, Customer>(&sql)
                    .bind(like_pattern(term))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM customers ORDER BY name COLLATE NOCASE",
                    CUSTOMER_COLUMNS
                );
                sqlx::query_as::<_, Customer>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        debug!(count = customers.len(), "Listed customers");
        Ok(customers)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        find(&self.pool, id).await
    }

    pub async fn create(&self, input: &CustomerInput) -> DbResult<Customer> {
        input.validate()?;

        let id = new_id();
        let now = Utc::now();

        debug!(id = %id, name = %input.name, "Creating customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, contact_name, email, phone,
                address_line1, address_line2, town, postcode, notes,
                account_balance_pence, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0, ?11, ?11)
            "#,
        )
        .bind(&id)
        .bind(input.name.trim())
        .bind(clean(&input.contact_name))
        .bind(clean(&input.email))
        .bind(clean(&input.phone))
        .bind(clean(&input.address_line1))
        .bind(clean(&input.address_line2))
        .bind(clean(&input.town))
        .bind(clean(&input.postcode).map(|p| p.to_uppercase()))
        .bind(clean(&input.notes))
        .bind(now)
        .execute(&self.pool)
        .await?;

        require(&self.pool, &id).await
    }

    pub async fn update(&self, id: &str, input: &CustomerInput) -> DbResult<Customer> {
        input.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2,
                contact_name = ?3,
                email = ?4,
                phone = ?5,
                address_line1 = ?6,
                address_line2 = ?7,
                town = ?8,
                postcode = ?9,
                notes = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(clean(&input.contact_name))
        .bind(clean(&input.email))
        .bind(clean(&input.phone))
        .bind(clean(&input.address_line1))
        .bind(clean(&input.address_line2))
        .bind(clean(&input.town))
        .bind(clean(&input.postcode).map(|p| p.to_uppercase()))
        .bind(clean(&input.notes))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        require(&self.pool, id).await
    }

    /// Deletes a customer with no history.
    ///
    /// Refused with `Conflict` while any job, invoice, quote or statement
    /// references the customer.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = begin_write(&self.pool).await?;

        require(&mut *tx, id).await?;

        let references: i64 = sqlx::query_scalar(
            r#"
            SELECT (SELECT COUNT(*) FROM jobs WHERE customer_id = ?1)
                 + (SELECT COUNT(*) FROM invoices WHERE customer_id = ?1)
                 + (SELECT COUNT(*) FROM quotes WHERE customer_id = ?1)
                 + (SELECT COUNT(*) FROM statements WHERE customer_id = ?1)
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if references > 0 {
            return Err(DbError::conflict(format!(
                "customer has {} job(s), invoice(s), quote(s) or statement(s)",
                references
            )));
        }

        sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(id = %id, "Customer deleted");
        Ok(())
    }

    /// Recomputes a customer's balance from scratch.
    pub async fn recompute_balance(&self, id: &str) -> DbResult<Money> {
        let mut tx = begin_write(&self.pool).await?;
        let balance = recompute_balance(&mut tx, id).await?;
        tx.commit().await?;
        Ok(balance)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
