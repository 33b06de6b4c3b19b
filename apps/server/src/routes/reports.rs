//! `/api/reports?from=2026-01-01&to=2026-03-31`
//!
//! Defaults to the year to date.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Datelike, NaiveDate, Utc};
use parlour_core::reports::{ReportInput, ReportRange, ReportSummary};
use parlour_db::{InvoiceFilter, JobFilter, PaymentFilter};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/reports", get(summary))
}

#[derive(Debug, Default, Deserialize)]
struct RangeQuery {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

async fn summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Json<ReportSummary>> {
    let today = Utc::now().date_naive();
    let start_of_year = NaiveDate::from_ymd_opt(today.year(), 1, 1)
        .ok_or_else(|| ApiError::internal("Could not work out the start of the year"))?;
    let range = ReportRange::new(query.from.unwrap_or(start_of_year), query.to.unwrap_or(today));

    let invoices = state
        .db
        .invoices()
        .list(&InvoiceFilter {
            issue_from: Some(range.from),
            issue_to: Some(range.to),
            ..Default::default()
        })
        .await?;
    let payments = state
        .db
        .payments()
        .list(&PaymentFilter {
            from: Some(range.from),
            to: Some(range.to),
            ..Default::default()
        })
        .await?;
    let jobs = state.db.jobs().list(&JobFilter::default()).await?;
    let job_ids: Vec<String> = jobs.iter().map(|j| j.id.clone()).collect();
    let job_items = state.db.jobs().list_items(&job_ids).await?;
    let customers = state.db.customers().list(None).await?;
    let inventory = state.db.inventory().list(None).await?;

    debug!(
        from = %range.from,
        to = %range.to,
        invoices = invoices.len(),
        jobs = jobs.len(),
        "Building report"
    );

    let input = ReportInput {
        invoices: &invoices,
        payments: &payments,
        jobs: &jobs,
        job_items: &job_items,
        customers: &customers,
        inventory: &inventory,
    };
    Ok(Json(ReportSummary::build(range, &input, today)))
}
