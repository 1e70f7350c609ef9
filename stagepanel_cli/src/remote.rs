//! Templates fetched from a running stagepanel server

use anyhow::{Context, Result};
use reqwest::Client;
use stagepanel_common::{Notification, PanelError, TemplateName, TemplateSource};
use std::time::Duration;

/// Path the server serves templates under unless configured otherwise
pub const DEFAULT_STATIC_PREFIX: &str = "/stagemonitor/static";

/// Fetches templates over HTTP from `{base_url}/tabs/...`
pub struct HttpTemplateSource {
    client: Client,
    base_url: String,
}

impl HttpTemplateSource {
    /// `server` is either a static root (".../stagemonitor/static") or a bare
    /// server URL, in which case the default static prefix is appended
    pub fn new(server: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: static_root(server),
        })
    }

    pub fn url(&self, name: TemplateName) -> String {
        format!("{}/{}", self.base_url, name.path())
    }
}

impl TemplateSource for HttpTemplateSource {
    async fn fetch(&self, name: TemplateName) -> Result<String, PanelError> {
        let url = self.url(name);
        tracing::debug!("Fetching template {}", url);

        let fetch_error = |reason: String| PanelError::TemplateFetch {
            name: name.to_string(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| fetch_error(e.to_string()))?;

        if !status.is_success() {
            let toast = Notification::error(format!("HTTP {}", status), Some(text.as_str()));
            return Err(fetch_error(toast.message));
        }

        Ok(text)
    }
}

fn static_root(server: &str) -> String {
    let trimmed = server.trim_end_matches('/');
    if trimmed.ends_with("/static") {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, DEFAULT_STATIC_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_urls() {
        let source = HttpTemplateSource::new("http://127.0.0.1:8090/").unwrap();
        assert_eq!(
            source.url(TemplateName::RequestTab),
            "http://127.0.0.1:8090/stagemonitor/static/tabs/request-tab.html"
        );

        let source = HttpTemplateSource::new("http://monitor.local/app/static").unwrap();
        assert_eq!(
            source.url(TemplateName::PageLoadTime),
            "http://monitor.local/app/static/tabs/request-tab-page-load-time.html"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let source = HttpTemplateSource::new("http://127.0.0.1:9").unwrap();
        let result = source.fetch(TemplateName::RequestTab).await;
        assert!(matches!(result, Err(PanelError::TemplateFetch { .. })));
    }
}
