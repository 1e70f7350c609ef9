//! Request tab assembly: trace in, rendered panel out

use crate::flatten::flatten_with;
use crate::metrics::{describe, is_excluded, is_formatted};
use crate::page_load::{self, PageLoadModel, PageLoadTiming};
use crate::settings::SettingsStore;
use crate::template::{HtmlRenderer, TemplateName, TemplateRenderer, TemplateSource};
use crate::threshold::{exceeds, is_truthy};
use crate::utils::{generate_uuid, load_all};
use crate::PanelError;
use serde::Serialize;
use serde_json::Value;

/// One row of the metric table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDisplay {
    pub key: String,
    pub name: String,
    pub description: String,
    pub value: String,
    pub exceeded_threshold: bool,
}

/// Model handed to the request tab template
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTabModel {
    pub metrics: Vec<MetricDisplay>,
    pub user_agent: Option<Value>,
    pub headers: Option<Value>,
}

/// Everything needed to render the request tab for one trace
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelModel {
    pub request_tab: RequestTabModel,
    pub page_load: Option<PageLoadModel>,
    /// True if any metric or the page load crossed a threshold
    pub threshold_exceeded: bool,
}

/// Build the panel model for a trace
///
/// Metrics keep the trace's key order. Excluded keys and nulls are left
/// out, and every threshold flag is folded into `threshold_exceeded`.
pub fn assemble<S: SettingsStore + ?Sized>(trace: &Value, settings: &S) -> PanelModel {
    let mut threshold_exceeded = false;
    let mut metrics = Vec::new();

    for (key, value) in flatten_with(trace, is_formatted) {
        if is_excluded(&key) || value.is_null() {
            continue;
        }

        let exceeded = exceeds(&key, &value, settings);
        threshold_exceeded |= exceeded;

        let description = describe(&key, &value);
        metrics.push(MetricDisplay {
            key,
            name: description.name,
            description: description.description,
            value: description.value,
            exceeded_threshold: exceeded,
        });
    }

    let page_load = page_load::compute(PageLoadTiming::from_trace(trace).as_ref(), settings);
    if let Some(model) = &page_load {
        threshold_exceeded |= model.threshold_exceeded();
    }

    PanelModel {
        request_tab: RequestTabModel {
            metrics,
            user_agent: trace.get("user_agent").cloned(),
            headers: trace.get("http").and_then(|http| http.get("headers")).cloned(),
        },
        page_load,
        threshold_exceeded,
    }
}

/// Outcome of rendering the request tab
#[derive(Debug, Clone, PartialEq)]
pub enum RequestTabRender {
    /// No trace to show; the tab should be hidden
    Hidden,
    Shown {
        /// Unique id of this render
        id: String,
        html: String,
        threshold_exceeded: bool,
    },
}

impl RequestTabRender {
    pub fn is_visible(&self) -> bool {
        matches!(self, RequestTabRender::Shown { .. })
    }

    pub fn threshold_exceeded(&self) -> bool {
        matches!(self, RequestTabRender::Shown { threshold_exceeded: true, .. })
    }
}

/// The request tab of the dashboard
///
/// Remembers the last trace it was given so the tab can be re-rendered
/// (for example after a settings change) without passing it again.
pub struct RequestTab<T, R = HtmlRenderer> {
    source: T,
    renderer: R,
    trace: Option<Value>,
}

impl<T: TemplateSource> RequestTab<T> {
    pub fn new(source: T) -> Self {
        Self {
            source,
            renderer: HtmlRenderer,
            trace: None,
        }
    }
}

impl<T: TemplateSource, R: TemplateRenderer> RequestTab<T, R> {
    pub fn with_renderer(source: T, renderer: R) -> Self {
        Self {
            source,
            renderer,
            trace: None,
        }
    }

    /// The trace currently shown
    pub fn trace(&self) -> Option<&Value> {
        self.trace.as_ref()
    }

    /// Forget the current trace; the next render without one hides the tab
    pub fn clear(&mut self) {
        self.trace = None;
    }

    /// Render the tab
    ///
    /// A new trace replaces the remembered one; `None` or a falsy JSON value
    /// (null, false, 0, "") re-renders the remembered trace. The required templates are fetched
    /// together, then the metric panel is rendered, then the page-load
    /// panel is rendered and placed above it.
    pub async fn render<S: SettingsStore + ?Sized>(
        &mut self,
        trace: Option<Value>,
        settings: &S,
    ) -> Result<RequestTabRender, PanelError> {
        if let Some(trace) = trace.filter(is_truthy) {
            self.trace = Some(trace);
        }

        let Some(trace) = &self.trace else {
            tracing::debug!("No request trace, hiding request tab");
            return Ok(RequestTabRender::Hidden);
        };

        let model = assemble(trace, settings);

        let mut names = vec![TemplateName::RequestTab];
        if model.page_load.is_some() {
            names.push(TemplateName::PageLoadTime);
        }
        let templates = load_all(&self.source, &names).await?;

        let mut html = self
            .renderer
            .render_request_tab(&templates[0], &model.request_tab);

        if let (Some(page_load), Some(template)) = (&model.page_load, templates.get(1)) {
            let page_load_html = self.renderer.render_page_load(template, page_load);
            html.insert_str(0, &page_load_html);
        }

        let id = generate_uuid();
        tracing::debug!(
            render_id = %id,
            metrics = model.request_tab.metrics.len(),
            threshold_exceeded = model.threshold_exceeded,
            "Rendered request tab"
        );

        Ok(RequestTabRender::Shown {
            id,
            html,
            threshold_exceeded: model.threshold_exceeded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setting_keys::{DB_COUNT_THRESHOLD, EXECUTION_THRESHOLD_MS};
    use crate::settings::MemorySettings;
    use crate::template::EmbeddedTemplates;
    use serde_json::json;

    fn sample_trace() -> Value {
        json!({
            "name": "GET /orders",
            "duration_ms": 150,
            "error": false,
            "exception": null,
            "parameters": {"page": "2", "sort": "date"},
            "http": {
                "url": "/orders",
                "status_code": 200,
                "headers": {"accept": "text/html", "host": "shop.local"}
            },
            "external_requests": {"jdbc": {"count": 7}},
            "externalRequestStats": [
                {"requestType": "jdbc", "executionCount": 7, "executionTime": 31.5}
            ],
            "user_agent": {"browser": "Firefox", "os": "Linux"},
            "call_tree_json": "{...}",
            "jaeger": {"trace_id": "abc"},
            "pageLoadTime": {
                "timeToFirstByte": 300,
                "serverTime": 150,
                "domProcessing": 200,
                "pageRendering": 100,
                "totalPageLoadTime": 600
            }
        })
    }

    fn keys(model: &PanelModel) -> Vec<&str> {
        model.request_tab.metrics.iter().map(|m| m.key.as_str()).collect()
    }

    #[test]
    fn test_assemble_order_and_exclusions() {
        let model = assemble(&sample_trace(), &MemorySettings::new());
        assert_eq!(
            keys(&model),
            vec![
                "name",
                "duration_ms",
                "error",
                "parameters",
                "http.url",
                "http.status_code",
                "external_requests.jdbc.count",
                "externalRequestStats",
            ]
        );
        assert_eq!(model.request_tab.metrics[3].value, "page: 2, sort: date");
        assert_eq!(model.request_tab.user_agent, Some(json!({"browser": "Firefox", "os": "Linux"})));
        assert_eq!(
            model.request_tab.headers,
            Some(json!({"accept": "text/html", "host": "shop.local"}))
        );
        assert!(model.page_load.is_some());
        assert!(!model.threshold_exceeded);
    }

    #[test]
    fn test_excluded_keys_never_listed() {
        let trace = json!({
            "http": {"headers": {"accept": "*/*"}},
            "user_agent": "curl/8.0",
            "jaeger": {"span": 1},
            "pageLoadTime": {"totalPageLoadTime": 0}
        });
        let model = assemble(&trace, &MemorySettings::new());
        assert!(model.request_tab.metrics.is_empty());
        assert!(model.page_load.is_none());
    }

    #[test]
    fn test_threshold_flags() {
        let settings = MemorySettings::new()
            .with(EXECUTION_THRESHOLD_MS, "100")
            .with(DB_COUNT_THRESHOLD, "10");
        let model = assemble(&sample_trace(), &settings);

        let flagged: Vec<&str> = model
            .request_tab
            .metrics
            .iter()
            .filter(|m| m.exceeded_threshold)
            .map(|m| m.key.as_str())
            .collect();
        assert_eq!(flagged, vec!["duration_ms"]);
        assert!(model.threshold_exceeded);
    }

    #[test]
    fn test_page_load_alone_sets_flag() {
        let settings = MemorySettings::new().with(EXECUTION_THRESHOLD_MS, "500");
        let trace = json!({
            "duration_ms": 10,
            "pageLoadTime": {
                "timeToFirstByte": 100,
                "serverTime": 10,
                "domProcessing": 400,
                "pageRendering": 100,
                "totalPageLoadTime": 600
            }
        });
        let model = assemble(&trace, &settings);
        assert!(!model.request_tab.metrics[0].exceeded_threshold);
        assert!(model.threshold_exceeded);
    }

    #[tokio::test]
    async fn test_render_without_trace_is_hidden() {
        let mut tab = RequestTab::new(EmbeddedTemplates);
        let rendered = tab.render(None, &MemorySettings::new()).await.unwrap();
        assert_eq!(rendered, RequestTabRender::Hidden);

        let rendered = tab.render(Some(Value::Null), &MemorySettings::new()).await.unwrap();
        assert!(!rendered.is_visible());
    }

    #[tokio::test]
    async fn test_falsy_traces_are_ignored() {
        let mut tab = RequestTab::new(EmbeddedTemplates);
        for falsy in [json!(false), json!(0), json!("")] {
            let rendered = tab.render(Some(falsy), &MemorySettings::new()).await.unwrap();
            assert_eq!(rendered, RequestTabRender::Hidden);
        }
        assert!(tab.trace().is_none());

        tab.render(Some(json!({"name": "GET /"})), &MemorySettings::new())
            .await
            .unwrap();
        let rendered = tab.render(Some(json!(0)), &MemorySettings::new()).await.unwrap();
        assert!(rendered.is_visible());
        assert_eq!(tab.trace(), Some(&json!({"name": "GET /"})));
    }

    #[tokio::test]
    async fn test_render_places_page_load_first() {
        let mut tab = RequestTab::new(EmbeddedTemplates);
        let rendered = tab
            .render(Some(sample_trace()), &MemorySettings::new())
            .await
            .unwrap();

        let RequestTabRender::Shown { html, id, .. } = rendered else {
            panic!("Expected request tab to be shown");
        };
        assert_eq!(id.len(), 36);
        let page_load = html.find("page-load-time").unwrap();
        let metrics = html.find("request-metrics").unwrap();
        assert!(page_load < metrics);
        assert!(html.contains("Network 25.00%"));
        assert!(!html.contains("call_tree_json"));
    }

    #[tokio::test]
    async fn test_render_remembers_trace() {
        let mut tab = RequestTab::new(EmbeddedTemplates);
        tab.render(Some(json!({"duration_ms": 150})), &MemorySettings::new())
            .await
            .unwrap();

        let settings = MemorySettings::new().with(EXECUTION_THRESHOLD_MS, "100");
        let rendered = tab.render(None, &settings).await.unwrap();
        assert!(rendered.threshold_exceeded());

        tab.clear();
        assert!(!tab.render(None, &settings).await.unwrap().is_visible());
    }

    struct FailingSource;

    impl TemplateSource for FailingSource {
        async fn fetch(&self, name: TemplateName) -> Result<String, PanelError> {
            Err(PanelError::TemplateFetch {
                name: name.to_string(),
                reason: "connection refused".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_template_fetch_failure_is_surfaced() {
        let mut tab = RequestTab::new(FailingSource);
        let result = tab.render(Some(json!({"name": "x"})), &MemorySettings::new()).await;
        assert!(matches!(result, Err(PanelError::TemplateFetch { .. })));
    }
}
