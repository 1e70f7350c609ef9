//! Request tab templates: where they come from and how they are filled

use crate::metrics::{display_value, format_pairs};
use crate::page_load::PageLoadModel;
use crate::panel::RequestTabModel;
use crate::utils::html_escape;
use crate::PanelError;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::str::FromStr;

/// The two templates making up the request tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateName {
    /// Metric table, user agent and headers
    RequestTab,
    /// Page-load breakdown, prepended above the metric table
    PageLoadTime,
}

impl TemplateName {
    pub const ALL: [TemplateName; 2] = [TemplateName::RequestTab, TemplateName::PageLoadTime];

    pub fn file_name(&self) -> &'static str {
        match self {
            TemplateName::RequestTab => "request-tab.html",
            TemplateName::PageLoadTime => "request-tab-page-load-time.html",
        }
    }

    /// Path relative to the static resource root
    pub fn path(&self) -> String {
        format!("tabs/{}", self.file_name())
    }
}

impl fmt::Display for TemplateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

impl FromStr for TemplateName {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplateName::ALL
            .into_iter()
            .find(|name| name.file_name() == s)
            .ok_or_else(|| PanelError::UnknownTemplate(s.to_string()))
    }
}

/// Somewhere templates can be fetched from
pub trait TemplateSource {
    fn fetch(&self, name: TemplateName) -> impl Future<Output = Result<String, PanelError>> + Send;
}

/// Templates compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTemplates;

impl EmbeddedTemplates {
    pub fn get(name: TemplateName) -> &'static str {
        match name {
            TemplateName::RequestTab => REQUEST_TAB_HTML,
            TemplateName::PageLoadTime => PAGE_LOAD_TIME_HTML,
        }
    }
}

impl TemplateSource for EmbeddedTemplates {
    async fn fetch(&self, name: TemplateName) -> Result<String, PanelError> {
        Ok(Self::get(name).to_string())
    }
}

/// Turns the assembled models into markup
pub trait TemplateRenderer {
    fn render_request_tab(&self, template: &str, model: &RequestTabModel) -> String;

    fn render_page_load(&self, template: &str, model: &PageLoadModel) -> String;
}

/// Renderer for `{{field}}` (escaped) and `{{{field}}}` (raw) placeholders
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl TemplateRenderer for HtmlRenderer {
    fn render_request_tab(&self, template: &str, model: &RequestTabModel) -> String {
        let metrics: String = model
            .metrics
            .iter()
            .map(|metric| {
                format!(
                    r#"      <tr class="{}" data-key="{}">
        <td><span class="tip" title="{}">{}</span></td>
        <td class="metric-value">{}</td>
      </tr>
"#,
                    if metric.exceeded_threshold { "threshold-exceeded" } else { "" },
                    html_escape(&metric.key),
                    html_escape(&metric.description),
                    html_escape(&metric.name),
                    html_escape(&metric.value),
                )
            })
            .collect();

        let headers: String = match &model.headers {
            Some(Value::Object(headers)) => headers
                .iter()
                .map(|(name, value)| {
                    format!(
                        "      <tr><th>{}</th><td>{}</td></tr>\n",
                        html_escape(name),
                        html_escape(&display_value(value))
                    )
                })
                .collect(),
            _ => String::new(),
        };

        let user_agent = match &model.user_agent {
            Some(agent @ Value::Object(_)) => format_pairs(agent),
            Some(agent) => display_value(agent),
            None => String::new(),
        };

        fill(
            template,
            &[
                ("metrics", metrics),
                ("headers", headers),
                ("userAgent", user_agent),
            ],
        )
    }

    fn render_page_load(&self, template: &str, model: &PageLoadModel) -> String {
        fill(template, &model.fields())
    }
}

/// Substitute placeholders in a single pass
///
/// `{{name}}` is HTML-escaped, `{{{name}}}` is inserted verbatim. Unknown
/// names render as nothing. Substituted text is never scanned again.
pub fn fill(template: &str, fields: &[(&str, String)]) -> String {
    let lookup = |key: &str| {
        fields
            .iter()
            .find(|(name, _)| *name == key.trim())
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    };

    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start..];

        let (raw, open, close) = if after.starts_with("{{{") {
            (true, 3, "}}}")
        } else {
            (false, 2, "}}")
        };

        match after[open..].find(close) {
            Some(end) => {
                let key = &after[open..open + end];
                if raw {
                    out.push_str(lookup(key));
                } else {
                    out.push_str(&html_escape(lookup(key)));
                }
                rest = &after[open + end + close.len()..];
            }
            None => {
                out.push_str(after);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

pub const REQUEST_TAB_HTML: &str = r#"<div class="request-tab">
  <table class="table table-condensed request-metrics">
    <thead>
      <tr><th>Metric</th><th>Value</th></tr>
    </thead>
    <tbody>
{{{metrics}}}    </tbody>
  </table>
  <h4>User agent</h4>
  <p class="user-agent">{{userAgent}}</p>
  <h4>Request headers</h4>
  <table class="table table-condensed request-headers">
    <tbody>
{{{headers}}}    </tbody>
  </table>
</div>
"#;

pub const PAGE_LOAD_TIME_HTML: &str = r#"<div class="page-load-time">
  <h4>Page load time <span class="{{totalClass}}">{{totalMs}} ms</span></h4>
  <div class="progress">
    <div class="progress-bar network" style="width: {{networkPercent}}%"
         title="Network: {{networkMs}} ms">Network {{networkPercent}}%</div>
    <div class="progress-bar server {{serverClass}}" style="width: {{serverPercent}}%"
         title="Server: {{serverMs}} ms">Server {{serverPercent}}%</div>
    <div class="progress-bar dom-processing" style="width: {{domProcessingPercent}}%"
         title="DOM processing: {{domProcessingMs}} ms">DOM {{domProcessingPercent}}%</div>
    <div class="progress-bar page-rendering" style="width: {{pageRenderingPercent}}%"
         title="Page rendering: {{pageRenderingMs}} ms">Rendering {{pageRenderingPercent}}%</div>
  </div>
</div>
"#;
