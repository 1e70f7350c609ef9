//! Request tab rendering endpoint

use super::{ApiError, AppState};
use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;
use serde_json::Value;
use stagepanel_common::RequestTabRender;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/request-tab", post(render_request_tab))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTabResponse {
    pub id: Option<String>,
    pub visible: bool,
    pub threshold_exceeded: bool,
    pub html: String,
}

impl From<RequestTabRender> for RequestTabResponse {
    fn from(render: RequestTabRender) -> Self {
        match render {
            RequestTabRender::Hidden => Self {
                id: None,
                visible: false,
                threshold_exceeded: false,
                html: String::new(),
            },
            RequestTabRender::Shown {
                id,
                html,
                threshold_exceeded,
            } => Self {
                id: Some(id),
                visible: true,
                threshold_exceeded,
                html,
            },
        }
    }
}

/// Render the request tab for a trace
///
/// A `null` body re-renders the last trace with the current settings.
async fn render_request_tab(
    State(state): State<AppState>,
    Json(trace): Json<Value>,
) -> Result<Json<RequestTabResponse>, ApiError> {
    let mut tab = state.request_tab.lock().await;
    let rendered = tab.render(Some(trace), state.settings.as_ref()).await?;

    if rendered.threshold_exceeded() {
        tracing::info!("Request trace exceeded a threshold");
    }

    Ok(Json(rendered.into()))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{send, state};
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_null_trace_hides_tab() {
        let (status, body) = send(&state(), "POST", "/api/request-tab", Some("null".to_string())).await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["visible"], false);
        assert_eq!(json["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_render_and_rerender_with_new_settings() {
        let state = state();
        let trace = json!({"name": "GET /cart", "duration_ms": 420});

        let (status, body) = send(&state, "POST", "/api/request-tab", Some(trace.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["visible"], true);
        assert_eq!(json["thresholdExceeded"], false);
        assert!(json["html"].as_str().unwrap().contains("GET /cart"));

        let (status, _) = send(
            &state,
            "PUT",
            "/api/settings/execution-threshold-milliseconds",
            Some("\"300\"".to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&state, "POST", "/api/request-tab", Some("null".to_string())).await;
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["visible"], true);
        assert_eq!(json["thresholdExceeded"], true);
    }
}
