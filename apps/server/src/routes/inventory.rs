//! `/api/inventory`

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use parlour_core::{InventoryItem, InventoryItemInput};
use serde::Deserialize;

use super::{found, SearchQuery};
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/inventory", get(list).post(create))
        .route("/inventory/low-stock", get(low_stock))
        .route("/inventory/{id}", get(show).put(update).delete(remove))
        .route("/inventory/{id}/adjust", post(adjust))
}

async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<InventoryItem>>> {
    Ok(Json(state.db.inventory().list(query.search.as_deref()).await?))
}

async fn low_stock(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<InventoryItem>>> {
    Ok(Json(state.db.inventory().low_stock().await?))
}

async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<InventoryItem>> {
    let item = state.db.inventory().get_by_id(&id).await?;
    Ok(Json(found(item, "Inventory item", &id)?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    Json(input): Json<InventoryItemInput>,
) -> ApiResult<(StatusCode, Json<InventoryItem>)> {
    let item = state.db.inventory().create(&input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<InventoryItemInput>,
) -> ApiResult<Json<InventoryItem>> {
    Ok(Json(state.db.inventory().update(&id, &input).await?))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.inventory().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct Adjustment {
    delta: i64,
}

/// Stock take or delivery: `{"delta": 5}` adds, `{"delta": -2}` removes.
async fn adjust(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<Adjustment>,
) -> ApiResult<Json<InventoryItem>> {
    Ok(Json(state.db.inventory().adjust_stock(&id, body.delta).await?))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_stock_adjustment_and_low_stock() {
        let app = test_support::app().await;
        let (status, item) = app
            .call(
                "POST",
                "/api/inventory",
                Some(json!({
                    "partNumber": "LN-SQ-20",
                    "name": "Square liner",
                    "unitPricePence": 2450,
                    "quantityInStock": 4,
                    "reorderLevel": 3
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let uri = format!("/api/inventory/{}/adjust", item["id"].as_str().unwrap());

        let (_, low) = app.call("GET", "/api/inventory/low-stock", None).await;
        assert!(low.as_array().unwrap().is_empty());

        let (status, body) = app.call("POST", &uri, Some(json!({ "delta": -2 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["quantityInStock"], 2);

        let (_, low) = app.call("GET", "/api/inventory/low-stock", None).await;
        assert_eq!(low[0]["partNumber"], "LN-SQ-20");

        let (status, body) = app.call("POST", &uri, Some(json!({ "delta": -5 }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "BUSINESS_RULE");
    }

    #[tokio::test]
    async fn test_duplicate_part_number_conflicts() {
        let app = test_support::app().await;
        let part = json!({ "partNumber": "FS-610", "name": "Filter socks", "unitPricePence": 3600 });
        let (status, _) = app.call("POST", "/api/inventory", Some(part.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = app.call("POST", "/api/inventory", Some(part)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");
    }
}
