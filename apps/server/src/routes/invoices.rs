//! # Invoice Routes
//!
//! ```text
//! GET    /api/invoices                     ?status&customerId&dueFrom&dueTo&issueFrom&issueTo
//! POST   /api/invoices                     standalone invoice, draft
//! GET    /api/invoices/next-number
//! POST   /api/invoices/from-job/{job_id}   completed job -> draft invoice
//! GET    /api/invoices/{id}                invoice, lines and payments
//! PUT    /api/invoices/{id}                drafts only
//! DELETE /api/invoices/{id}                drafts only
//! POST   /api/invoices/{id}/send
//! POST   /api/invoices/{id}/void
//! GET    /api/invoices/{id}/pdf
//! POST   /api/invoices/{id}/remind         posts to the reminder webhook
//! GET    /api/invoices/{id}/mailto         prefilled reminder email link
//! GET    /api/invoices/{id}/payments
//! POST   /api/invoices/{id}/payments
//! ```

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Datelike, Utc};
use parlour_core::reminders::{mailto_link, ReminderPayload};
use parlour_core::{DocumentKind, Invoice, InvoiceDetail, InvoiceInput, Payment, PaymentInput};
use parlour_db::{InvoiceFilter, PaymentFilter};
use parlour_docs::{render_invoice, InvoiceDocument};
use serde::Serialize;
use tracing::info;

use super::{customer_of, found, pdf_response, NextNumber};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/invoices", get(list).post(create))
        .route("/invoices/next-number", get(next_number))
        .route("/invoices/from-job/{job_id}", post(create_from_job))
        .route("/invoices/{id}", get(show).put(update).delete(remove))
        .route("/invoices/{id}/send", post(send))
        .route("/invoices/{id}/void", post(void))
        .route("/invoices/{id}/pdf", get(pdf))
        .route("/invoices/{id}/remind", post(remind))
        .route("/invoices/{id}/mailto", get(mailto))
        .route("/invoices/{id}/payments", get(payments).post(record_payment))
}

async fn list(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<InvoiceFilter>,
) -> ApiResult<Json<Vec<Invoice>>> {
    Ok(Json(state.db.invoices().list(&filter).await?))
}

async fn next_number(State(state): State<Arc<AppState>>) -> ApiResult<Json<NextNumber>> {
    let settings = state.db.settings().get().await?;
    let number = state
        .db
        .sequences()
        .preview_number(
            DocumentKind::Invoice,
            &settings.invoice_prefix,
            Utc::now().year(),
        )
        .await?;
    Ok(Json(NextNumber { number }))
}

async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<InvoiceDetail>> {
    let detail = state.db.invoices().get_detail(&id).await?;
    Ok(Json(found(detail, "Invoice", &id)?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    Json(input): Json<InvoiceInput>,
) -> ApiResult<(StatusCode, Json<InvoiceDetail>)> {
    let detail = state.db.invoices().create(&input).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn create_from_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<(StatusCode, Json<InvoiceDetail>)> {
    let detail = state.db.invoices().create_from_job(&job_id).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<InvoiceInput>,
) -> ApiResult<Json<InvoiceDetail>> {
    Ok(Json(state.db.invoices().update(&id, &input).await?))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.invoices().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn send(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Invoice>> {
    Ok(Json(state.db.invoices().mark_sent(&id).await?))
}

async fn void(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Invoice>> {
    Ok(Json(state.db.invoices().void(&id).await?))
}

async fn pdf(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<Response> {
    let detail = found(state.db.invoices().get_detail(&id).await?, "Invoice", &id)?;
    let customer = customer_of(&state, &detail.invoice.customer_id).await?;
    let settings = state.db.settings().get().await?;

    let doc = InvoiceDocument::new(detail, customer, settings, Utc::now().date_naive())?;
    let bytes = render_invoice(&doc)?;
    Ok(pdf_response(&doc.file_name(), bytes))
}

/// Loads what a reminder needs: the invoice (with its read-time status),
/// its customer and the settings.
async fn reminder_for(state: &AppState, id: &str) -> ApiResult<(ReminderPayload, Option<String>)> {
    let invoice = found(state.db.invoices().get_by_id(id).await?, "Invoice", id)?;
    let customer = customer_of(state, &invoice.customer_id).await?;
    let settings = state.db.settings().get().await?;

    let payload = ReminderPayload::for_invoice(&invoice, &customer, &settings, Utc::now())?;
    Ok((payload, settings.reminder_webhook_url))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReminderSent {
    webhook_status: u16,
    attempts: u32,
    payload: ReminderPayload,
}

async fn remind(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReminderSent>> {
    let (payload, webhook_url) = reminder_for(&state, &id).await?;
    let delivery = state.notifier.send(webhook_url.as_deref(), &payload).await?;

    info!(
        invoice = %payload.invoice_number,
        attempts = delivery.attempts,
        "Reminder sent"
    );
    Ok(Json(ReminderSent {
        webhook_status: delivery.status,
        attempts: delivery.attempts,
        payload,
    }))
}

#[derive(Debug, Serialize)]
struct MailtoReminder {
    link: String,
    subject: String,
    body: String,
}

async fn mailto(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<MailtoReminder>> {
    let (payload, _) = reminder_for(&state, &id).await?;
    let email = payload
        .customer_email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| ApiError::business_rule("Customer has no email address"))?;

    let subject = payload.email_subject();
    let body = payload.email_body();
    Ok(Json(MailtoReminder {
        link: mailto_link(email, &subject, &body),
        subject,
        body,
    }))
}

async fn payments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Payment>>> {
    found(state.db.invoices().get_by_id(&id).await?, "Invoice", &id)?;
    let filter = PaymentFilter {
        invoice_id: Some(id),
        ..Default::default()
    };
    Ok(Json(state.db.payments().list(&filter).await?))
}

async fn record_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<PaymentInput>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    let payment = state.db.payments().record(&id, &input).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{self, TestApp};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use chrono::{Datelike, Utc};
    use serde_json::{json, Value};

    /// A £120.00 standalone invoice (100.00 + 20% VAT), sent.
    async fn sent_invoice(app: &TestApp, customer_id: &str) -> Value {
        let (status, draft) = app
            .call(
                "POST",
                "/api/invoices",
                Some(json!({
                    "customerId": customer_id,
                    "items": [
                        { "description": "Pulsator overhaul", "quantityHundredths": 100, "unitPricePence": 10000 }
                    ]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(draft["status"], "draft");
        assert_eq!(draft["totalPence"], 12_000);

        let (status, sent) = app
            .call("POST", &format!("/api/invoices/{}/send", draft["id"].as_str().unwrap()), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        sent
    }

    #[tokio::test]
    async fn test_next_number_preview() {
        let app = test_support::app().await;
        let (status, body) = app.call("GET", "/api/invoices/next-number", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["number"], format!("INV-{}-0001", Utc::now().year()));
    }

    #[tokio::test]
    async fn test_payments_update_status_and_balance() {
        let app = test_support::app().await;
        let customer = app.customer("Hill Farm").await;
        let invoice = sent_invoice(&app, &customer).await;
        let id = invoice["id"].as_str().unwrap();
        let uri = format!("/api/invoices/{id}/payments");

        let (status, _) = app
            .call("POST", &uri, Some(json!({ "amountPence": 5000, "method": "bank_transfer" })))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, detail) = app.call("GET", &format!("/api/invoices/{id}"), None).await;
        assert_eq!(detail["status"], "partially_paid");
        assert_eq!(detail["amountPaidPence"], 5000);
        assert_eq!(detail["payments"].as_array().unwrap().len(), 1);

        let (_, customer) = app.call("GET", &format!("/api/customers/{customer}"), None).await;
        assert_eq!(customer["accountBalancePence"], 7000);

        let (status, body) = app
            .call("POST", &uri, Some(json!({ "amountPence": 7001, "method": "cash" })))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "BUSINESS_RULE");

        let (_, list) = app.call("GET", &uri, None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_pdf_download() {
        let app = test_support::app().await;
        let customer = app.customer("Hill Farm").await;
        let invoice = sent_invoice(&app, &customer).await;

        let request = Request::get(format!("/api/invoices/{}/pdf", invoice["id"].as_str().unwrap()))
            .header(header::AUTHORIZATION, format!("Bearer {}", app.token))
            .body(Body::empty())
            .unwrap();
        let response = app.raw(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.contains(invoice["invoiceNumber"].as_str().unwrap()));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_remind_without_webhook() {
        let app = test_support::app().await;
        let customer = app.customer("Hill Farm").await;
        let invoice = sent_invoice(&app, &customer).await;

        let (status, body) = app
            .call("POST", &format!("/api/invoices/{}/remind", invoice["id"].as_str().unwrap()), None)
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "BUSINESS_RULE");
    }

    #[tokio::test]
    async fn test_mailto_needs_customer_email() {
        let app = test_support::app().await;
        let (_, customer) = app
            .call(
                "POST",
                "/api/customers",
                Some(json!({ "name": "Brook Dairy", "email": "sian@example.com" })),
            )
            .await;
        let invoice = sent_invoice(&app, customer["id"].as_str().unwrap()).await;
        let (status, body) = app
            .call("GET", &format!("/api/invoices/{}/mailto", invoice["id"].as_str().unwrap()), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["link"].as_str().unwrap().starts_with("mailto:sian@example.com?subject="));
        assert!(body["subject"].as_str().unwrap().contains(invoice["invoiceNumber"].as_str().unwrap()));

        let no_email = app.customer("Ty Mawr").await;
        let invoice = sent_invoice(&app, &no_email).await;
        let (status, _) = app
            .call("GET", &format!("/api/invoices/{}/mailto", invoice["id"].as_str().unwrap()), None)
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_void_and_draft_rules() {
        let app = test_support::app().await;
        let customer = app.customer("Hill Farm").await;
        let invoice = sent_invoice(&app, &customer).await;
        let id = invoice["id"].as_str().unwrap();

        let (status, _) = app.call("DELETE", &format!("/api/invoices/{id}"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = app.call("POST", &format!("/api/invoices/{id}/void"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "void");

        let (_, customer) = app.call("GET", &format!("/api/customers/{customer}"), None).await;
        assert_eq!(customer["accountBalancePence"], 0);
    }
}
