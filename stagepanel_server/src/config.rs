//! Server configuration loaded from environment variables

use stagepanel_common::setting_keys::{
    validate, DB_COUNT_THRESHOLD, EXECUTION_THRESHOLD_MS, NOTIFY_ON_ERROR,
};
use std::env;

/// Environment variable -> setting it seeds
const SETTING_VARS: [(&str, &str); 3] = [
    ("DB_COUNT_THRESHOLD", DB_COUNT_THRESHOLD),
    ("EXECUTION_THRESHOLD_MS", EXECUTION_THRESHOLD_MS),
    ("NOTIFY_ON_ERROR", NOTIFY_ON_ERROR),
];

#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,

    /// Port for the dashboard API
    pub port: u16,

    /// Path the templates are served under (e.g., "/stagemonitor/static")
    pub static_prefix: String,

    /// Settings applied at startup, before the user changes anything
    pub default_settings: Vec<(&'static str, String)>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let default_settings = default_settings_from(|var| env::var(var).ok())?;

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8090".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            static_prefix: normalize_prefix(
                &env::var("STATIC_PREFIX").unwrap_or_else(|_| "/stagemonitor/static".to_string()),
            ),
            default_settings,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8090,
            static_prefix: "/stagemonitor/static".to_string(),
            default_settings: Vec::new(),
        }
    }
}

/// Collect the startup settings, checked the same way as a settings update
fn default_settings_from(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Vec<(&'static str, String)>, ConfigError> {
    let mut settings = Vec::new();
    for (var, key) in SETTING_VARS {
        if let Some(value) = lookup(var) {
            validate(key, &value).map_err(|reason| ConfigError::InvalidSetting { var, reason })?;
            settings.push((key, value));
        }
    }
    Ok(settings)
}

/// Leading slash, no trailing slash
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid {var}: {reason}")]
    InvalidSetting { var: &'static str, reason: String },
}
