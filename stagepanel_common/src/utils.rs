//! Small helpers shared by the dashboard surfaces

use crate::template::{TemplateName, TemplateSource};
use crate::PanelError;
use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Fetch several templates at once
///
/// Resolves with the templates in the order they were asked for, or with
/// the first failure.
pub async fn load_all<T: TemplateSource + ?Sized>(
    source: &T,
    names: &[TemplateName],
) -> Result<Vec<String>, PanelError> {
    tracing::debug!("Loading templates: {:?}", names);
    try_join_all(names.iter().map(|name| source.fetch(*name))).await
}

/// Random version 4 UUID
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Escape text for use in HTML content and attribute values
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape regex metacharacters so `s` matches literally
pub fn regex_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if ".?*+^$[]\\(){}|-".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Values of a mapping in key order
pub fn values(map: &Map<String, Value>) -> Vec<&Value> {
    map.values().collect()
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Danger,
}

/// A toast shown to the dashboard user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Error toast
    ///
    /// Uses the response body as the message when there is one and it is
    /// not a full HTML page, otherwise the fallback.
    pub fn error(fallback: impl Into<String>, response_text: Option<&str>) -> Self {
        let message = match response_text {
            Some(text) if !text.is_empty() && !text.contains("<body") => html_escape(text),
            _ => fallback.into(),
        };
        Self {
            kind: NotificationKind::Danger,
            message,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub from: String,
    pub align: String,
}

/// How toasts are displayed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastOptions {
    pub allow_dismiss: bool,
    pub placement: Placement,
    pub mouse_over: String,
    pub delay: u64,
}

impl Default for ToastOptions {
    fn default() -> Self {
        Self {
            allow_dismiss: true,
            placement: Placement {
                from: "top".to_string(),
                align: "right".to_string(),
            },
            mouse_over: "pause".to_string(),
            delay: 5000,
        }
    }
}

// ============================================================================
// Metric matching
// ============================================================================

/// A metric identified by name and tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricName {
    pub name: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Selects metrics by name and tag values; `*` or an empty value matches any tag value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricMatcher {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

pub fn matches(metric: &MetricName, matcher: &MetricMatcher) -> bool {
    if let Some(name) = matcher.name.as_deref().filter(|n| !n.is_empty()) {
        if metric.name != name {
            return false;
        }
    }

    matcher
        .tags
        .iter()
        .filter(|(_, value)| !value.is_empty() && value.as_str() != "*")
        .all(|(tag, value)| metric.tags.get(tag) == Some(value))
}

/// `name{tag:value,...} value_type`
pub fn metric_as_string(metric: &MetricName, value_type: &str) -> String {
    let tags = serde_json::to_string(&metric.tags).unwrap_or_default();
    format!("{}{} {}", metric.name, tags.replace('"', ""), value_type)
}
