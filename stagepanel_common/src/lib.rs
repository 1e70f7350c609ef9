//! Stagepanel Common - Request tab pipeline shared by the server and CLI
//!
//! Turns a captured request trace into the "request tab" of the
//! monitoring dashboard:
//! - flattens the nested trace into dot-joined metric keys
//! - describes each metric with a display name, description and formatted value
//! - flags metrics that exceed the user's alert thresholds
//! - breaks the client page load down into network/server/DOM/render phases
//! - renders both panels from HTML templates

pub mod flatten;
pub mod metrics;
pub mod page_load;
pub mod panel;
pub mod settings;
pub mod template;
pub mod threshold;
pub mod utils;

use thiserror::Error;

pub use flatten::{flatten, flatten_with, MAX_DEPTH};
pub use metrics::{describe, is_excluded, Description, MetricInfo};
pub use page_load::{PageLoadModel, PageLoadTiming, Percent};
pub use panel::{assemble, MetricDisplay, PanelModel, RequestTab, RequestTabModel, RequestTabRender};
pub use settings::{MemorySettings, SettingsStore};
pub use template::{EmbeddedTemplates, HtmlRenderer, TemplateName, TemplateRenderer, TemplateSource};
pub use threshold::{exceeds, ThresholdRule};
pub use utils::{MetricMatcher, MetricName, Notification, NotificationKind, ToastOptions};

/// Errors raised while producing the request tab
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("Failed to fetch template {name}: {reason}")]
    TemplateFetch { name: String, reason: String },

    #[error("Unknown template: {0}")]
    UnknownTemplate(String),
}

/// Setting keys read by the threshold evaluator
pub mod setting_keys {
    /// Maximum number of JDBC calls per request before it is flagged
    pub const DB_COUNT_THRESHOLD: &str = "db-count-threshold";

    /// Maximum server or page-load time in milliseconds
    pub const EXECUTION_THRESHOLD_MS: &str = "execution-threshold-milliseconds";

    /// Set to "false" to stop flagging requests that ended with an error
    pub const NOTIFY_ON_ERROR: &str = "notify-on-error";

    pub const ALL: [&str; 3] = [DB_COUNT_THRESHOLD, EXECUTION_THRESHOLD_MS, NOTIFY_ON_ERROR];

    /// Check a value before it is stored.
    /// Thresholds must be numbers, the error flag a boolean; other keys are free-form.
    pub fn validate(key: &str, value: &str) -> Result<(), String> {
        match key {
            DB_COUNT_THRESHOLD | EXECUTION_THRESHOLD_MS => value
                .trim()
                .parse::<f64>()
                .map(|_| ())
                .map_err(|_| format!("{} must be a number", key)),
            NOTIFY_ON_ERROR => match value {
                "true" | "false" => Ok(()),
                _ => Err(format!("{} must be true or false", key)),
            },
            _ => Ok(()),
        }
    }

}
