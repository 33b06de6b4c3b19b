//! `/api/engineers`

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use parlour_core::{Engineer, EngineerInput};
use serde::Deserialize;

use super::found;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/engineers", get(list).post(create))
        .route("/engineers/{id}", get(show).put(update))
        .route("/engineers/{id}/deactivate", post(deactivate))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EngineerQuery {
    #[serde(default)]
    active_only: bool,
}

async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EngineerQuery>,
) -> ApiResult<Json<Vec<Engineer>>> {
    Ok(Json(state.db.engineers().list(query.active_only).await?))
}

async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Engineer>> {
    let engineer = state.db.engineers().get_by_id(&id).await?;
    Ok(Json(found(engineer, "Engineer", &id)?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    Json(input): Json<EngineerInput>,
) -> ApiResult<(StatusCode, Json<Engineer>)> {
    let engineer = state.db.engineers().create(&input).await?;
    Ok((StatusCode::CREATED, Json(engineer)))
}

async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<EngineerInput>,
) -> ApiResult<Json<Engineer>> {
    Ok(Json(state.db.engineers().update(&id, &input).await?))
}

/// Engineers are never deleted; jobs keep pointing at them.
async fn deactivate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Engineer>> {
    Ok(Json(state.db.engineers().deactivate(&id).await?))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_deactivated_engineer_leaves_active_list() {
        let app = test_support::app().await;
        let (status, engineer) = app
            .call(
                "POST",
                "/api/engineers",
                Some(json!({ "name": "Gareth Williams", "hourlyRatePence": 4500 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(engineer["isActive"], true);

        let id = engineer["id"].as_str().unwrap();
        let (status, _) = app
            .call("POST", &format!("/api/engineers/{id}/deactivate"), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, active) = app.call("GET", "/api/engineers?activeOnly=true", None).await;
        assert!(active.as_array().unwrap().is_empty());
        let (_, all) = app.call("GET", "/api/engineers", None).await;
        assert_eq!(all.as_array().unwrap().len(), 1);
    }
}
