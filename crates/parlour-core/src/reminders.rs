//! # Payment Reminders
//!
//! The JSON body posted to the reminder webhook, and `mailto:` links for
//! sending a reminder from the user's own mail client.
//!
//! ## Webhook Payload
//! ```json
//! {
//!   "event": "invoice.reminder",
//!   "invoiceId": "…",
//!   "invoiceNumber": "INV-2026-0042",
//!   "customerName": "Hill Farm",
//!   "customerEmail": "accounts@hillfarm.example",
//!   "amountDuePence": 12000,
//!   "amountDue": "£120.00",
//!   "dueDate": "2026-03-01",
//!   "daysOverdue": 4,
//!   "companyName": "Valley Dairy Services",
//!   "sentAt": "2026-03-05T09:00:00Z"
//! }
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use url::form_urlencoded;

use crate::balance::{amount_due, days_overdue};
use crate::error::{CoreError, CoreResult};
use crate::types::{Customer, Invoice, InvoiceStatus, Settings};

pub const REMINDER_EVENT: &str = "invoice.reminder";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReminderPayload {
    pub event: String,
    pub invoice_id: String,
    pub invoice_number: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub amount_due_pence: i64,
    pub amount_due: String,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    pub days_overdue: i64,
    pub company_name: String,
    #[ts(as = "String")]
    pub sent_at: DateTime<Utc>,
}

impl ReminderPayload {
    /// Builds a reminder for an invoice that still has money owing.
    ///
    /// Drafts, void and fully paid invoices have nothing to remind about.
    pub fn for_invoice(
        invoice: &Invoice,
        customer: &Customer,
        settings: &Settings,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        let due = amount_due(invoice);
        if matches!(invoice.status, InvoiceStatus::Draft | InvoiceStatus::Void) || !due.is_positive() {
            return Err(CoreError::document_state(
                "Invoice",
                invoice.invoice_number.as_str(),
                invoice.status,
                "send a reminder",
            ));
        }

        Ok(ReminderPayload {
            event: REMINDER_EVENT.to_string(),
            invoice_id: invoice.id.clone(),
            invoice_number: invoice.invoice_number.clone(),
            customer_name: customer.name.clone(),
            customer_email: customer.email.clone(),
            amount_due_pence: due.pence(),
            amount_due: due.to_string(),
            due_date: invoice.due_date,
            days_overdue: days_overdue(invoice.due_date, now.date_naive()),
            company_name: settings.company_name.clone(),
            sent_at: now,
        })
    }

    pub fn email_subject(&self) -> String {
        format!("Payment reminder: invoice {}", self.invoice_number)
    }

    pub fn email_body(&self) -> String {
        let timing = if self.days_overdue > 0 {
            format!(
                "was due on {} and is now {} day{} overdue",
                self.due_date.format("%d/%m/%Y"),
                self.days_overdue,
                if self.days_overdue == 1 { "" } else { "s" }
            )
        } else {
            format!("is due on {}", self.due_date.format("%d/%m/%Y"))
        };

        format!(
            "Dear {},\n\nThis is a reminder that invoice {} for {} {}.\n\n\
             If you have already paid, please ignore this message.\n\n\
             Kind regards,\n{}",
            self.customer_name, self.invoice_number, self.amount_due, timing, self.company_name
        )
    }
}

/// Builds a `mailto:` link with subject and body.
///
/// Spaces are encoded as `%20`, not `+`, since mail clients do not decode
/// `+` in mailto query strings.
pub fn mailto_link(email: &str, subject: &str, body: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("subject", subject)
        .append_pair("body", body)
        .finish()
        .replace('+', "%20");

    let recipient: String = form_urlencoded::byte_serialize(email.trim().as_bytes())
        .collect::<String>()
        .replace("%40", "@");

    format!("mailto:{}?{}", recipient, query)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixtures(status: InvoiceStatus, paid: i64) -> (Invoice, Customer, Settings) {
        let now = Utc::now();
        let invoice = Invoice {
            id: "inv-1".to_string(),
            invoice_number: "INV-2026-0042".to_string(),
            customer_id: "c1".to_string(),
            job_id: None,
            status,
            issue_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            subtotal_pence: 10_000,
            vat_pence: 2_000,
            vat_rate_bps: 2000,
            total_pence: 12_000,
            amount_paid_pence: paid,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        let customer = Customer {
            id: "c1".to_string(),
            name: "Hill Farm".to_string(),
            contact_name: None,
            email: Some("accounts@hillfarm.example".to_string()),
            phone: None,
            address_line1: None,
            address_line2: None,
            town: None,
            postcode: None,
            notes: None,
            account_balance_pence: 0,
            created_at: now,
            updated_at: now,
        };
        let settings = Settings {
            company_name: "Valley Dairy Services".to_string(),
            address: None,
            phone: None,
            email: None,
            vat_number: None,
            vat_rate_bps: 2000,
            default_labour_rate_pence: 4500,
            payment_terms_days: 30,
            bank_name: None,
            sort_code: None,
            account_number: None,
            invoice_prefix: "INV".to_string(),
            quote_prefix: "QUO".to_string(),
            statement_prefix: "STM".to_string(),
            reminder_webhook_url: None,
            updated_at: now,
        };
        (invoice, customer, settings)
    }

    #[test]
    fn test_payload_for_overdue_invoice() {
        let (invoice, customer, settings) = fixtures(InvoiceStatus::PartiallyPaid, 2_000);
        let now = Utc.with_ymd_and_hms(2026, 3, 5, 9, 0, 0).unwrap();

        let payload = ReminderPayload::for_invoice(&invoice, &customer, &settings, now).unwrap();
        assert_eq!(payload.event, "invoice.reminder");
        assert_eq!(payload.amount_due_pence, 10_000);
        assert_eq!(payload.amount_due, "£100.00");
        assert_eq!(payload.days_overdue, 4);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["invoiceNumber"], "INV-2026-0042");
        assert_eq!(json["dueDate"], "2026-03-01");

        assert!(payload.email_body().contains("4 days overdue"));
    }

    #[test]
    fn test_no_reminder_for_paid_or_draft() {
        let now = Utc::now();
        let (paid, customer, settings) = fixtures(InvoiceStatus::Paid, 12_000);
        assert!(ReminderPayload::for_invoice(&paid, &customer, &settings, now).is_err());

        let (draft, customer, settings) = fixtures(InvoiceStatus::Draft, 0);
        assert!(ReminderPayload::for_invoice(&draft, &customer, &settings, now).is_err());
    }

    #[test]
    fn test_mailto_link_encoding() {
        let link = mailto_link("accounts@hillfarm.example", "Invoice INV-1 & more", "Line one\nLine two");
        assert_eq!(
            link,
            "mailto:accounts@hillfarm.example?subject=Invoice%20INV-1%20%26%20more&body=Line%20one%0ALine%20two"
        );
    }
}
