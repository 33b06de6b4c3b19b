//! # Job Routes
//!
//! ```text
//! GET    /api/jobs                       ?status&customerId&engineerId&from&to
//! POST   /api/jobs
//! GET    /api/jobs/{id}                  job with its lines
//! PUT    /api/jobs/{id}
//! DELETE /api/jobs/{id}                  409 once a non-draft invoice exists
//! POST   /api/jobs/{id}/items            part lines take stock
//! DELETE /api/jobs/{id}/items/{item_id}  part lines give stock back
//! PUT    /api/jobs/{id}/status
//! ```

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use parlour_core::{Job, JobDetail, JobInput, JobItemInput, JobStatus};
use parlour_db::JobFilter;
use serde::Deserialize;

use super::found;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs", get(list).post(create))
        .route("/jobs/{id}", get(show).put(update).delete(remove))
        .route("/jobs/{id}/items", post(add_item))
        .route("/jobs/{id}/items/{item_id}", delete(remove_item))
        .route("/jobs/{id}/status", put(set_status))
}

/// Body of the status endpoints (jobs and pipeline moves).
#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: JobStatus,
}

async fn list(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<JobFilter>,
) -> ApiResult<Json<Vec<Job>>> {
    Ok(Json(state.db.jobs().list(&filter).await?))
}

async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<JobDetail>> {
    let detail = state.db.jobs().get_detail(&id).await?;
    Ok(Json(found(detail, "Job", &id)?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    Json(input): Json<JobInput>,
) -> ApiResult<(StatusCode, Json<Job>)> {
    let job = state.db.jobs().create(&input).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<JobInput>,
) -> ApiResult<Json<Job>> {
    Ok(Json(state.db.jobs().update(&id, &input).await?))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.jobs().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<JobItemInput>,
) -> ApiResult<(StatusCode, Json<JobDetail>)> {
    let detail = state.db.jobs().add_item(&id, &input).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn remove_item(
    State(state): State<Arc<AppState>>,
    Path((id, item_id)): Path<(String, String)>,
) -> ApiResult<Json<JobDetail>> {
    Ok(Json(state.db.jobs().remove_item(&id, &item_id).await?))
}

async fn set_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<StatusChange>,
) -> ApiResult<Json<Job>> {
    Ok(Json(state.db.jobs().set_status(&id, body.status).await?))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{self, TestApp};
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    async fn part(app: &TestApp, stock: i64) -> String {
        let (status, body) = app
            .call(
                "POST",
                "/api/inventory",
                Some(json!({
                    "partNumber": "PL-EL-60",
                    "name": "Electronic pulsator",
                    "unitPricePence": 21500,
                    "quantityInStock": stock
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    async fn stock(app: &TestApp, part_id: &str) -> i64 {
        let (_, body) = app.call("GET", &format!("/api/inventory/{part_id}"), None).await;
        body["quantityInStock"].as_i64().unwrap()
    }

    async fn job(app: &TestApp, customer_id: &str) -> Value {
        let (status, body) = app
            .call(
                "POST",
                "/api/jobs",
                Some(json!({ "customerId": customer_id, "title": "Pulsator swap" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    #[tokio::test]
    async fn test_lines_move_stock_and_totals() {
        let app = test_support::app().await;
        let customer = app.customer("Hill Farm").await;
        let part_id = part(&app, 5).await;
        let job = job(&app, &customer).await;
        assert_eq!(job["status"], "pending");
        let id = job["id"].as_str().unwrap();

        let (status, detail) = app
            .call(
                "POST",
                &format!("/api/jobs/{id}/items"),
                Some(json!({ "inventoryItemId": part_id, "kind": "part", "quantityHundredths": 200 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(detail["subtotalPence"], 43_000);
        assert_eq!(detail["totalPence"], 51_600);
        assert_eq!(stock(&app, &part_id).await, 3);

        let item_id = detail["items"][0]["id"].as_str().unwrap();
        let (status, detail) = app
            .call("DELETE", &format!("/api/jobs/{id}/items/{item_id}"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["totalPence"], 0);
        assert_eq!(stock(&app, &part_id).await, 5);
    }

    #[tokio::test]
    async fn test_not_enough_stock() {
        let app = test_support::app().await;
        let customer = app.customer("Hill Farm").await;
        let part_id = part(&app, 1).await;
        let job = job(&app, &customer).await;

        let (status, body) = app
            .call(
                "POST",
                &format!("/api/jobs/{}/items", job["id"].as_str().unwrap()),
                Some(json!({ "inventoryItemId": part_id, "kind": "part", "quantityHundredths": 300 })),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "BUSINESS_RULE");
        assert_eq!(stock(&app, &part_id).await, 1);
    }

    #[tokio::test]
    async fn test_status_moves_and_filter() {
        let app = test_support::app().await;
        let customer = app.customer("Hill Farm").await;
        let job = job(&app, &customer).await;
        let uri = format!("/api/jobs/{}/status", job["id"].as_str().unwrap());

        let (status, body) = app.call("PUT", &uri, Some(json!({ "status": "in_progress" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "in_progress");

        let (status, body) = app.call("PUT", &uri, Some(json!({ "status": "invoiced" }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "BUSINESS_RULE");

        let (_, list) = app.call("GET", "/api/jobs?status=in_progress", None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        let (_, list) = app.call("GET", "/api/jobs?status=completed", None).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_refused_once_invoiced() {
        let app = test_support::app().await;
        let customer = app.customer("Hill Farm").await;
        let job = job(&app, &customer).await;
        let id = job["id"].as_str().unwrap();

        app.call(
            "POST",
            &format!("/api/jobs/{id}/items"),
            Some(json!({ "kind": "labour", "description": "Fitting", "quantityHundredths": 100, "unitPricePence": 4500 })),
        )
        .await;
        app.call("PUT", &format!("/api/jobs/{id}/status"), Some(json!({ "status": "completed" })))
            .await;
        let (status, invoice) = app
            .call("POST", &format!("/api/invoices/from-job/{id}"), None)
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let invoice_id = invoice["id"].as_str().unwrap();
        let (status, _) = app
            .call("POST", &format!("/api/invoices/{invoice_id}/send"), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app.call("DELETE", &format!("/api/jobs/{id}"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");
    }
}
