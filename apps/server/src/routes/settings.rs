//! `/api/settings`

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router};
use parlour_core::{Settings, SettingsInput};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/settings", get(show).put(update))
}

async fn show(State(state): State<Arc<AppState>>) -> ApiResult<Json<Settings>> {
    Ok(Json(state.db.settings().get().await?))
}

/// Admin only: VAT, prefixes and bank details print on every document.
async fn update(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Json(input): Json<SettingsInput>,
) -> ApiResult<Json<Settings>> {
    caller.require_admin()?;
    let settings = state.db.settings().update(&input).await?;
    info!(user_id = %caller.id, "Settings updated");
    Ok(Json(settings))
}
