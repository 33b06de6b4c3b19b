//! `/api/calendar?year=2026&month=3`
//!
//! Month grid of invoice due dates and scheduled jobs. Defaults to the
//! current month.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Datelike, Utc};
use parlour_core::calendar::{month_bounds, CalendarMonth};
use parlour_db::{InvoiceFilter, JobFilter};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/calendar", get(month))
}

#[derive(Debug, Default, Deserialize)]
struct MonthQuery {
    year: Option<i32>,
    month: Option<u32>,
}

async fn month(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MonthQuery>,
) -> ApiResult<Json<CalendarMonth>> {
    let today = Utc::now().date_naive();
    let year = query.year.unwrap_or(today.year());
    let month = query.month.unwrap_or(today.month());
    let (first, last) = month_bounds(year, month)?;

    let invoices = state
        .db
        .invoices()
        .list(&InvoiceFilter {
            due_from: Some(first),
            due_to: Some(last),
            ..Default::default()
        })
        .await?;
    let jobs = state
        .db
        .jobs()
        .list(&JobFilter {
            from: Some(first),
            to: Some(last),
            ..Default::default()
        })
        .await?;

    Ok(Json(CalendarMonth::build(year, month, &invoices, &jobs, today)?))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_month_grid() {
        let app = test_support::app().await;
        let customer = app.customer("Brook Dairy").await;
        app.call(
            "POST",
            "/api/jobs",
            Some(json!({ "customerId": customer, "title": "Wash system check", "scheduledDate": "2026-03-10" })),
        )
        .await;
        let (_, draft) = app
            .call(
                "POST",
                "/api/invoices",
                Some(json!({
                    "customerId": customer,
                    "issueDate": "2026-03-01",
                    "dueDate": "2026-03-31",
                    "items": [{ "description": "Call-out", "quantityHundredths": 100, "unitPricePence": 5000 }]
                })),
            )
            .await;
        app.call("POST", &format!("/api/invoices/{}/send", draft["id"].as_str().unwrap()), None)
            .await;

        let (status, grid) = app.call("GET", "/api/calendar?year=2026&month=3", None).await;
        assert_eq!(status, StatusCode::OK);
        let days = grid["days"].as_array().unwrap();
        assert_eq!(days.len(), 31);
        assert_eq!(days[9]["jobsScheduled"].as_array().unwrap().len(), 1);
        assert_eq!(days[30]["invoicesDue"].as_array().unwrap().len(), 1);
        assert_eq!(grid["totalDuePence"], 6000);

        let (status, body) = app.call("GET", "/api/calendar?year=2026&month=13", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}
