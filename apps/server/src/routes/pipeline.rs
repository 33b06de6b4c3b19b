//! # Pipeline Routes
//!
//! The job board: one column per [`JobStatus`], cards carrying the customer
//! name. Dragging a card to another column is a `PUT` with the new status;
//! moves the transition table forbids come back as `BUSINESS_RULE`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use parlour_core::pipeline::PipelineBoard;
use parlour_core::Job;
use parlour_db::JobFilter;
use tracing::debug;

use super::jobs::StatusChange;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pipeline", get(board))
        .route("/pipeline/{job_id}", put(move_card))
}

async fn board(State(state): State<Arc<AppState>>) -> ApiResult<Json<PipelineBoard>> {
    let jobs = state.db.jobs().list(&JobFilter::default()).await?;
    let names: HashMap<String, String> = state
        .db
        .customers()
        .list(None)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let board = PipelineBoard::build(&jobs, |id| names.get(id).cloned());
    Ok(Json(board))
}

async fn move_card(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
    Json(body): Json<StatusChange>,
) -> ApiResult<Json<Job>> {
    let job = state.db.jobs().set_status(&job_id, body.status).await?;
    debug!(job_id = %job_id, status = %job.status, "Pipeline card moved");
    Ok(Json(job))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_board_columns_and_moves() {
        let app = test_support::app().await;
        let customer = app.customer("Hill Farm").await;
        let (_, job) = app
            .call("POST", "/api/jobs", Some(json!({ "customerId": customer, "title": "Vacuum pump service" })))
            .await;
        let job_id = job["id"].as_str().unwrap();

        let (status, board) = app.call("GET", "/api/pipeline", None).await;
        assert_eq!(status, StatusCode::OK);
        let columns = board["columns"].as_array().unwrap();
        assert_eq!(columns.len(), 6);
        assert_eq!(columns[0]["status"], "pending");
        assert_eq!(columns[0]["cards"][0]["customerName"], "Hill Farm");

        let (status, moved) = app
            .call("PUT", &format!("/api/pipeline/{job_id}"), Some(json!({ "status": "scheduled" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(moved["status"], "scheduled");

        let (status, _) = app
            .call("PUT", &format!("/api/pipeline/{job_id}"), Some(json!({ "status": "invoiced" })))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, board) = app.call("GET", "/api/pipeline", None).await;
        assert_eq!(board["columns"][1]["cards"][0]["jobId"], job_id);
    }
}
