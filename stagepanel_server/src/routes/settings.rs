//! Widget settings endpoints

use super::{ApiError, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use stagepanel_common::setting_keys::validate;
use stagepanel_common::{Notification, SettingsStore};
use std::collections::BTreeMap;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/settings", get(list_settings))
        .route("/api/settings/{key}", get(get_setting).put(put_setting))
}

async fn list_settings(State(state): State<AppState>) -> Json<BTreeMap<String, String>> {
    Json(state.settings.all())
}

async fn get_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<String>, ApiError> {
    state
        .settings
        .get(&key)
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, format!("Setting {} is not set", key)))
}

async fn put_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(value): Json<String>,
) -> Result<Json<Notification>, ApiError> {
    validate(&key, &value).map_err(|message| ApiError::new(StatusCode::BAD_REQUEST, message))?;

    tracing::info!("Setting {} = {}", key, value);
    state.settings.set(&key, value);
    Ok(Json(Notification::success(format!("Saved {}", key))))
}
