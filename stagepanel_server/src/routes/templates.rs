//! Static request tab templates, fetched by dashboards that render client-side

use super::{ApiError, AppState};
use axum::{extract::Path, response::Html, routing::get, Router};
use stagepanel_common::{EmbeddedTemplates, TemplateName};

/// Templates live under `{prefix}/tabs/`
pub fn router(prefix: &str) -> Router<AppState> {
    Router::new().route(&format!("{}/tabs/{{file}}", prefix), get(serve_template))
}

async fn serve_template(Path(file): Path<String>) -> Result<Html<&'static str>, ApiError> {
    let name: TemplateName = file.parse()?;
    tracing::debug!("Serving template {}", name);
    Ok(Html(EmbeddedTemplates::get(name)))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{send, state};
    use axum::http::StatusCode;
    use stagepanel_common::template::PAGE_LOAD_TIME_HTML;

    #[tokio::test]
    async fn test_serve_known_template() {
        let (status, body) = send(
            &state(),
            "GET",
            "/stagemonitor/static/tabs/request-tab-page-load-time.html",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, PAGE_LOAD_TIME_HTML);
    }

    #[tokio::test]
    async fn test_unknown_template() {
        let (status, body) = send(&state(), "GET", "/stagemonitor/static/tabs/nope.html", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("danger"));
    }
}
