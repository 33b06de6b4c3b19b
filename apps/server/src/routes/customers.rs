//! `/api/customers`

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use parlour_core::{Customer, CustomerInput};
use serde::Serialize;

use super::{found, SearchQuery};
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/customers", get(list).post(create))
        .route("/customers/{id}", get(show).put(update).delete(remove))
        .route("/customers/{id}/recompute-balance", post(recompute_balance))
}

async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Customer>>> {
    Ok(Json(state.db.customers().list(query.search.as_deref()).await?))
}

async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Customer>> {
    let customer = state.db.customers().get_by_id(&id).await?;
    Ok(Json(found(customer, "Customer", &id)?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    Json(input): Json<CustomerInput>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let customer = state.db.customers().create(&input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<CustomerInput>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.db.customers().update(&id, &input).await?))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.customers().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Balance {
    customer_id: String,
    account_balance_pence: i64,
}

async fn recompute_balance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Balance>> {
    let balance = state.db.customers().recompute_balance(&id).await?;
    Ok(Json(Balance {
        customer_id: id,
        account_balance_pence: balance.pence(),
    }))
}
