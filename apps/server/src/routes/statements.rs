//! # Statement Routes
//!
//! ```text
//! GET    /api/statements              ?customerId
//! POST   /api/statements              {"jobId": "...", "notes": "..."}
//! GET    /api/statements/next-number
//! GET    /api/statements/{id}
//! DELETE /api/statements/{id}
//! GET    /api/statements/{id}/pdf
//! ```

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Datelike, Utc};
use parlour_core::{DocumentKind, Statement, StatementDetail};
use parlour_docs::{render_statement, StatementDocument};
use serde::Deserialize;

use super::{customer_of, found, pdf_response, NextNumber};
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/statements", get(list).post(generate))
        .route("/statements/next-number", get(next_number))
        .route("/statements/{id}", get(show).delete(remove))
        .route("/statements/{id}/pdf", get(pdf))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementQuery {
    customer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateStatement {
    job_id: String,
    notes: Option<String>,
}

async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatementQuery>,
) -> ApiResult<Json<Vec<Statement>>> {
    Ok(Json(
        state.db.statements().list(query.customer_id.as_deref()).await?,
    ))
}

async fn next_number(State(state): State<Arc<AppState>>) -> ApiResult<Json<NextNumber>> {
    let settings = state.db.settings().get().await?;
    let number = state
        .db
        .sequences()
        .preview_number(
            DocumentKind::Statement,
            &settings.statement_prefix,
            Utc::now().year(),
        )
        .await?;
    Ok(Json(NextNumber { number }))
}

async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatementDetail>> {
    let detail = state.db.statements().get_detail(&id).await?;
    Ok(Json(found(detail, "Statement", &id)?))
}

async fn generate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateStatement>,
) -> ApiResult<(StatusCode, Json<StatementDetail>)> {
    let detail = state
        .db
        .statements()
        .generate_for_job(&body.job_id, body.notes)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.statements().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn pdf(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<Response> {
    let detail = found(state.db.statements().get_detail(&id).await?, "Statement", &id)?;
    let customer = customer_of(&state, &detail.statement.customer_id).await?;
    let settings = state.db.settings().get().await?;
    let job_title = state
        .db
        .jobs()
        .get_by_id(&detail.statement.job_id)
        .await?
        .map(|job| job.title);

    let doc = StatementDocument::new(detail, customer, settings, job_title)?;
    let bytes = render_statement(&doc)?;
    Ok(pdf_response(&doc.file_name(), bytes))
}
