//! # Quote Routes
//!
//! ```text
//! GET    /api/quotes                ?status&customerId
//! POST   /api/quotes
//! GET    /api/quotes/next-number
//! GET    /api/quotes/{id}
//! PUT    /api/quotes/{id}           drafts only
//! DELETE /api/quotes/{id}           not once converted
//! PUT    /api/quotes/{id}/status
//! POST   /api/quotes/{id}/convert   accepted quote -> pending job
//! GET    /api/quotes/{id}/pdf
//! ```

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{Datelike, Utc};
use parlour_core::{DocumentKind, Job, Quote, QuoteDetail, QuoteInput, QuoteStatus};
use parlour_db::QuoteFilter;
use parlour_docs::{render_quote, QuoteDocument};
use serde::Deserialize;

use super::{customer_of, found, pdf_response, NextNumber};
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/quotes", get(list).post(create))
        .route("/quotes/next-number", get(next_number))
        .route("/quotes/{id}", get(show).put(update).delete(remove))
        .route("/quotes/{id}/status", put(set_status))
        .route("/quotes/{id}/convert", post(convert))
        .route("/quotes/{id}/pdf", get(pdf))
}

#[derive(Debug, Deserialize)]
struct QuoteStatusChange {
    status: QuoteStatus,
}

async fn list(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<QuoteFilter>,
) -> ApiResult<Json<Vec<Quote>>> {
    Ok(Json(state.db.quotes().list(&filter).await?))
}

async fn next_number(State(state): State<Arc<AppState>>) -> ApiResult<Json<NextNumber>> {
    let settings = state.db.settings().get().await?;
    let number = state
        .db
        .sequences()
        .preview_number(DocumentKind::Quote, &settings.quote_prefix, Utc::now().year())
        .await?;
    Ok(Json(NextNumber { number }))
}

async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<QuoteDetail>> {
    let detail = state.db.quotes().get_detail(&id).await?;
    Ok(Json(found(detail, "Quote", &id)?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    Json(input): Json<QuoteInput>,
) -> ApiResult<(StatusCode, Json<QuoteDetail>)> {
    let detail = state.db.quotes().create(&input).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<QuoteInput>,
) -> ApiResult<Json<QuoteDetail>> {
    Ok(Json(state.db.quotes().update(&id, &input).await?))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.quotes().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<QuoteStatusChange>,
) -> ApiResult<Json<Quote>> {
    Ok(Json(state.db.quotes().set_status(&id, body.status).await?))
}

async fn convert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<Job>)> {
    let job = state.db.quotes().convert_to_job(&id).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

async fn pdf(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<Response> {
    let detail = found(state.db.quotes().get_detail(&id).await?, "Quote", &id)?;
    let customer = customer_of(&state, &detail.quote.customer_id).await?;
    let settings = state.db.settings().get().await?;

    let doc = QuoteDocument::new(detail, customer, settings)?;
    let bytes = render_quote(&doc)?;
    Ok(pdf_response(&doc.file_name(), bytes))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_accept_and_convert_once() {
        let app = test_support::app().await;
        let customer = app.customer("Pant Glas").await;
        let (status, quote) = app
            .call(
                "POST",
                "/api/quotes",
                Some(json!({
                    "customerId": customer,
                    "items": [
                        { "description": "Stainless milk line (per metre)", "quantityHundredths": 1200, "unitPricePence": 2500 },
                        { "description": "Fitting labour", "quantityHundredths": 800, "unitPricePence": 4500 }
                    ]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(quote["subtotalPence"], 66_000);
        let id = quote["id"].as_str().unwrap();

        // Not accepted yet
        let (status, _) = app.call("POST", &format!("/api/quotes/{id}/convert"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = app
            .call("PUT", &format!("/api/quotes/{id}/status"), Some(json!({ "status": "accepted" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "accepted");

        let (status, job) = app.call("POST", &format!("/api/quotes/{id}/convert"), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(job["status"], "pending");
        assert_eq!(job["quoteId"], id);
        assert_eq!(job["totalPence"], quote["totalPence"]);

        let (status, body) = app.call("POST", &format!("/api/quotes/{id}/convert"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (status, _) = app.call("DELETE", &format!("/api/quotes/{id}"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_quote_needs_valid_customer_id() {
        let app = test_support::app().await;
        let (status, body) = app
            .call("POST", "/api/quotes", Some(json!({ "customerId": "farm-1", "items": [] })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}
