//! Route handlers for the dashboard API

pub mod panel;
pub mod settings;
pub mod templates;

use crate::config::Config;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use dashmap::DashMap;
use serde::Serialize;
use stagepanel_common::{
    setting_keys, EmbeddedTemplates, Notification, PanelError, RequestTab, SettingsStore,
    ToastOptions,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub settings: Arc<SharedSettings>,
    /// The request tab, holding the last trace it rendered
    pub request_tab: Arc<Mutex<RequestTab<EmbeddedTemplates>>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let settings = SharedSettings::default();
        for (key, value) in &config.default_settings {
            settings.set(key, value.clone());
        }

        Self {
            config: Arc::new(config),
            settings: Arc::new(settings),
            request_tab: Arc::new(Mutex::new(RequestTab::new(EmbeddedTemplates))),
        }
    }
}

/// Widget settings shared by all dashboard users of this process
#[derive(Debug, Default)]
pub struct SharedSettings {
    values: DashMap<String, String>,
}

impl SharedSettings {
    pub fn set(&self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    pub fn all(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

impl SettingsStore for SharedSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|value| value.clone())
    }
}

/// Error answered as a danger toast
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub notification: Notification,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            notification: Notification::error(message, None),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.notification)).into_response()
    }
}

impl From<PanelError> for ApiError {
    fn from(e: PanelError) -> Self {
        let status = match e {
            PanelError::TemplateFetch { .. } => StatusCode::BAD_GATEWAY,
            PanelError::UnknownTemplate(_) => StatusCode::NOT_FOUND,
        };
        tracing::warn!("Request tab error: {}", e);
        ApiError::new(status, e.to_string())
    }
}

/// Build the full router
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/ui-config", get(ui_config))
        .merge(panel::router())
        .merge(settings::router())
        .merge(templates::router(&state.config.static_prefix))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    service: String,
    version: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "stagepanel".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// UI Config
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UiConfig {
    toast: ToastOptions,
    setting_keys: Vec<&'static str>,
    static_prefix: String,
}

/// Everything the dashboard needs before its first render
async fn ui_config(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl IntoResponse {
    Json(UiConfig {
        toast: ToastOptions::default(),
        setting_keys: setting_keys::ALL.to_vec(),
        static_prefix: state.config.static_prefix.clone(),
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::{send, state};
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&state(), "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["service"], "stagepanel");
    }

    #[tokio::test]
    async fn test_ui_config() {
        let (status, body) = send(&state(), "GET", "/api/ui-config", None).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["toast"]["delay"], 5000);
        assert_eq!(json["settingKeys"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_default_settings_applied() {
        let config = Config {
            default_settings: vec![(setting_keys::EXECUTION_THRESHOLD_MS, "250".to_string())],
            ..Config::default()
        };
        let state = AppState::new(config);
        assert_eq!(
            state.settings.get(setting_keys::EXECUTION_THRESHOLD_MS),
            Some("250".to_string())
        );
    }

    #[tokio::test]
    async fn test_template_fetch_error_is_bad_gateway() {
        let error = ApiError::from(PanelError::TemplateFetch {
            name: "tabs/request-tab.html".to_string(),
            reason: "connection refused".to_string(),
        });
        assert_eq!(error.status, StatusCode::BAD_GATEWAY);

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["type"], "danger");
        assert!(json["message"]
            .as_str()
            .unwrap()
            .contains("connection refused"));
    }

    #[test]
    fn test_unknown_template_is_not_found() {
        let error = ApiError::from(PanelError::UnknownTemplate("tabs/nope.html".to_string()));
        assert_eq!(error.status, StatusCode::NOT_FOUND);
    }
}
