//! # Payment Repository
//!
//! Money received against invoices. Every write re-derives the invoice's
//! paid amount and status and the customer's balance on one transaction.

use chrono::{NaiveDate, Utc};
use parlour_core::balance::amount_due;
use parlour_core::{CoreError, Invoice, InvoiceStatus, Money, Payment, PaymentInput};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{begin_write, clean, customer, invoice, new_id};

const PAYMENT_COLUMNS: &str = r#"
    id, invoice_id, amount_pence, method, paid_on, reference, created_at
"#;

/// Filters for [`PaymentRepository::list`]. Dates bound `paid_on`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentFilter {
    pub invoice_id: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

pub(crate) async fn on_invoice<'e, E>(executor: E, invoice_id: &str) -> DbResult<Vec<Payment>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        "SELECT {} FROM payments WHERE invoice_id = ?1 ORDER BY paid_on, created_at",
        PAYMENT_COLUMNS
    );
    let payments = sqlx::query_as::<_, Payment>(&sql)
        .bind(invoice_id)
        .fetch_all(executor)
        .await?;
    Ok(payments)
}

#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    pub async fn list(&self, filter: &PaymentFilter) -> DbResult<Vec<Payment>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM payments WHERE 1 = 1", PAYMENT_COLUMNS));

        if let Some(invoice_id) = filter.invoice_id.as_deref() {
            qb.push(" AND invoice_id = ").push_bind(invoice_id);
        }
        if let Some(from) = filter.from {
            qb.push(" AND paid_on >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            qb.push(" AND paid_on <= ").push_bind(to);
        }
        qb.push(" ORDER BY paid_on DESC, created_at DESC");

        let payments = qb.build_query_as::<Payment>().fetch_all(&self.pool).await?;
        Ok(payments)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Payment>> {
        let sql = format!("SELECT {} FROM payments WHERE id = ?1", PAYMENT_COLUMNS);
        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(payment)
    }

    /// Records a payment against a sent invoice.
    ///
    /// ## Errors
    /// - `InvalidDocumentState` for a draft, void or already paid invoice
    /// - `Overpayment` when the amount exceeds what is still due
    pub async fn record(&self, invoice_id: &str, input: &PaymentInput) -> DbResult<Payment> {
        input.validate()?;

        let mut tx = begin_write(&self.pool).await?;
        let invoice = invoice::require(&mut *tx, invoice_id).await?;

        if matches!(
            invoice.status,
            InvoiceStatus::Draft | InvoiceStatus::Void | InvoiceStatus::Paid
        ) {
            return Err(CoreError::document_state(
                "Invoice",
                invoice.invoice_number.as_str(),
                invoice.status,
                "take a payment",
            )
            .into());
        }

        let amount = Money::from_pence(input.amount_pence);
        let due = amount_due(&invoice);
        if amount > due {
            return Err(CoreError::Overpayment {
                amount: amount.to_string(),
                due: due.to_string(),
            }
            .into());
        }

        let id = new_id();
        let paid_on = input.paid_on.unwrap_or_else(|| Utc::now().date_naive());

        sqlx::query(
            r#"
            INSERT INTO payments (id, invoice_id, amount_pence, method, paid_on, reference, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&id)
        .bind(invoice_id)
        .bind(amount.pence())
        .bind(input.method)
        .bind(paid_on)
        .bind(clean(&input.reference))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let updated: Invoice = invoice::recompute_amount_paid(&mut tx, invoice_id).await?;
        customer::recompute_balance(&mut tx, &updated.customer_id).await?;
        tx.commit().await?;

        info!(
            id = %id,
            invoice = %updated.invoice_number,
            amount = amount.pence(),
            status = %updated.status,
            "Payment recorded"
        );

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Payment", &id))
    }

    /// Deletes a payment and returns the invoice as it now stands.
    pub async fn delete(&self, id: &str) -> DbResult<Invoice> {
        let mut tx = begin_write(&self.pool).await?;

        let invoice_id: String = sqlx::query_scalar("SELECT invoice_id FROM payments WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Payment", id))?;

        sqlx::query("DELETE FROM payments WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let updated = invoice::recompute_amount_paid(&mut tx, &invoice_id).await?;
        customer::recompute_balance(&mut tx, &updated.customer_id).await?;
        tx.commit().await?;

        debug!(id = %id, invoice_id = %invoice_id, "Payment deleted");
        Ok(updated)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;
    use crate::Database;
    use parlour_core::{DocumentLineInput, InvoiceInput, PaymentMethod};

    /// A sent invoice for £120.00 (100.00 + VAT).
    async fn sent_invoice(db: &Database) -> Invoice {
        let customer = test_support::customer(db, "Hill Farm").await;
        let detail = db
            .invoices()
            .create(&InvoiceInput {
                customer_id: customer.id.clone(),
                items: vec![DocumentLineInput {
                    description: "Pulsator overhaul".to_string(),
                    quantity_hundredths: 100,
                    unit_price_pence: 10_000,
                }],
                ..Default::default()
            })
            .await
            .unwrap();
        db.invoices().mark_sent(&detail.invoice.id).await.unwrap()
    }

    fn pay(pence: i64) -> PaymentInput {
        PaymentInput {
            amount_pence: pence,
            method: PaymentMethod::BankTransfer,
            paid_on: None,
            reference: Some("BACS 1182".to_string()),
        }
    }

    async fn balance(db: &Database, customer_id: &str) -> i64 {
        db.customers()
            .get_by_id(customer_id)
            .await
            .unwrap()
            .unwrap()
            .account_balance_pence
    }

    #[tokio::test]
    async fn test_partial_then_full_payment() {
        let db = test_support::db().await;
        let invoice = sent_invoice(&db).await;
        assert_eq!(balance(&db, &invoice.customer_id).await, 12_000);

        db.payments().record(&invoice.id, &pay(5000)).await.unwrap();
        let after = db.invoices().get_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(after.status, InvoiceStatus::PartiallyPaid);
        assert_eq!(after.amount_paid_pence, 5000);
        assert_eq!(balance(&db, &invoice.customer_id).await, 7000);

        db.payments().record(&invoice.id, &pay(7000)).await.unwrap();
        let after = db.invoices().get_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(after.status, InvoiceStatus::Paid);
        assert_eq!(balance(&db, &invoice.customer_id).await, 0);

        let err = db.payments().record(&invoice.id, &pay(1)).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InvalidDocumentState { .. })));
    }

    #[tokio::test]
    async fn test_overpayment_rejected() {
        let db = test_support::db().await;
        let invoice = sent_invoice(&db).await;

        let err = db.payments().record(&invoice.id, &pay(12_001)).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Overpayment { .. })));
        assert!(db
            .payments()
            .list(&PaymentFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_draft_cannot_take_payment() {
        let db = test_support::db().await;
        let customer = test_support::customer(&db, "Hill Farm").await;
        let detail = db
            .invoices()
            .create(&InvoiceInput {
                customer_id: customer.id.clone(),
                items: vec![DocumentLineInput {
                    description: "Call-out".to_string(),
                    quantity_hundredths: 100,
                    unit_price_pence: 3500,
                }],
                ..Default::default()
            })
            .await
            .unwrap();

        let err = db.payments().record(&detail.invoice.id, &pay(100)).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InvalidDocumentState { .. })));
    }

    #[tokio::test]
    async fn test_delete_payment_reopens_invoice() {
        let db = test_support::db().await;
        let invoice = sent_invoice(&db).await;
        let payment = db.payments().record(&invoice.id, &pay(12_000)).await.unwrap();

        let reopened = db.payments().delete(&payment.id).await.unwrap();
        assert_eq!(reopened.status, InvoiceStatus::Sent);
        assert_eq!(reopened.amount_paid_pence, 0);
        assert_eq!(balance(&db, &invoice.customer_id).await, 12_000);
    }

    #[tokio::test]
    async fn test_paid_invoice_cannot_be_voided() {
        let db = test_support::db().await;
        let invoice = sent_invoice(&db).await;
        db.payments().record(&invoice.id, &pay(2000)).await.unwrap();

        let err = db.invoices().void(&invoice.id).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InvalidDocumentState { .. })));
    }

    #[tokio::test]
    async fn test_list_by_invoice_and_date() {
        let db = test_support::db().await;
        let invoice = sent_invoice(&db).await;
        let mut early = pay(1000);
        early.paid_on = NaiveDate::from_ymd_opt(2026, 1, 10);
        let mut late = pay(1000);
        late.paid_on = NaiveDate::from_ymd_opt(2026, 2, 10);
        db.payments().record(&invoice.id, &early).await.unwrap();
        db.payments().record(&invoice.id, &late).await.unwrap();

        let january = db
            .payments()
            .list(&PaymentFilter {
                invoice_id: Some(invoice.id.clone()),
                from: NaiveDate::from_ymd_opt(2026, 1, 1),
                to: NaiveDate::from_ymd_opt(2026, 1, 31),
            })
            .await
            .unwrap();
        assert_eq!(january.len(), 1);
        assert_eq!(january[0].paid_on, NaiveDate::from_ymd_opt(2026, 1, 10).unwrap());
    }
}
