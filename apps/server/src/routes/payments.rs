//! `/api/payments`
//!
//! Payments are recorded through `/api/invoices/{id}/payments`; this module
//! covers the cross-invoice listing and removal of a mistaken entry.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use parlour_core::{Invoice, Payment};
use parlour_db::PaymentFilter;

use super::found;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/payments", get(list))
        .route("/payments/{id}", get(show).delete(remove))
}

async fn list(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<PaymentFilter>,
) -> ApiResult<Json<Vec<Payment>>> {
    Ok(Json(state.db.payments().list(&filter).await?))
}

async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Payment>> {
    let payment = state.db.payments().get_by_id(&id).await?;
    Ok(Json(found(payment, "Payment", &id)?))
}

/// Returns the invoice as it stands after the payment is gone.
async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Invoice>> {
    Ok(Json(state.db.payments().delete(&id).await?))
}
