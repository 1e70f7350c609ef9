//! Alert thresholds for well-known request metrics

use crate::setting_keys::{DB_COUNT_THRESHOLD, EXECUTION_THRESHOLD_MS, NOTIFY_ON_ERROR};
use crate::settings::SettingsStore;
use serde_json::Value;

/// How a metric is checked against its setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdRule {
    /// Exceeded when the value is numerically greater than the setting.
    ///
    /// A missing, empty or non-numeric setting never flags. The browser
    /// widget compared against `localStorage` directly, where a missing or
    /// empty value coerced to 0 and flagged every positive value; an unset
    /// threshold here means "no threshold" instead.
    GreaterThan(&'static str),
    /// Exceeded when the value is truthy, unless the setting is "false"
    Truthy(&'static str),
}

/// Metric key -> rule. Keys not listed here never exceed a threshold.
pub const RULES: [(&str, ThresholdRule); 3] = [
    ("external_requests.jdbc.count", ThresholdRule::GreaterThan(DB_COUNT_THRESHOLD)),
    ("duration_ms", ThresholdRule::GreaterThan(EXECUTION_THRESHOLD_MS)),
    ("error", ThresholdRule::Truthy(NOTIFY_ON_ERROR)),
];

/// Find the rule for a metric key
pub fn rule_for(key: &str) -> Option<ThresholdRule> {
    RULES
        .iter()
        .find(|(rule_key, _)| *rule_key == key)
        .map(|(_, rule)| *rule)
}

/// Check a flattened metric against the user's thresholds
///
/// Settings are read on every call.
pub fn exceeds<S: SettingsStore + ?Sized>(key: &str, value: &Value, settings: &S) -> bool {
    match rule_for(key) {
        Some(rule) => rule.evaluate(value, settings),
        None => false,
    }
}

impl ThresholdRule {
    pub fn setting(&self) -> &'static str {
        match self {
            ThresholdRule::GreaterThan(setting) | ThresholdRule::Truthy(setting) => *setting,
        }
    }

    pub fn evaluate<S: SettingsStore + ?Sized>(&self, value: &Value, settings: &S) -> bool {
        match self {
            ThresholdRule::GreaterThan(setting) => {
                let limit = settings.get(setting).and_then(|s| parse_number(&s));
                match (as_number(value), limit) {
                    (Some(value), Some(limit)) => value > limit,
                    _ => false,
                }
            }
            ThresholdRule::Truthy(setting) => {
                is_truthy(value) && settings.get(setting).as_deref() != Some("false")
            }
        }
    }
}

/// Compare a raw number against the numeric setting `key`
pub fn above_setting<S: SettingsStore + ?Sized>(value: f64, key: &str, settings: &S) -> bool {
    settings
        .get(key)
        .and_then(|s| parse_number(&s))
        .is_some_and(|limit| value > limit)
}

/// Numeric view of a trace value; strings holding numbers count
pub fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    number.filter(|n| !n.is_nan())
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| !n.is_nan())
}

/// Truthiness of a trace value: false, 0, "" and null are falsy
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettings;
    use serde_json::json;

    fn settings() -> MemorySettings {
        MemorySettings::new()
            .with(EXECUTION_THRESHOLD_MS, "100")
            .with(DB_COUNT_THRESHOLD, "5")
    }

    #[test]
    fn test_duration_threshold() {
        let settings = settings();
        assert!(exceeds("duration_ms", &json!(150), &settings));
        assert!(!exceeds("duration_ms", &json!(50), &settings));
        assert!(!exceeds("duration_ms", &json!(100), &settings));
    }

    #[test]
    fn test_db_count_threshold() {
        let settings = settings();
        assert!(exceeds("external_requests.jdbc.count", &json!(6), &settings));
        assert!(!exceeds("external_requests.jdbc.count", &json!(5), &settings));
    }

    #[test]
    fn test_error_flag() {
        let mut settings = settings();
        assert!(exceeds("error", &json!(true), &settings));
        assert!(!exceeds("error", &json!(false), &settings));

        settings.set(NOTIFY_ON_ERROR, "false");
        assert!(!exceeds("error", &json!(true), &settings));

        settings.set(NOTIFY_ON_ERROR, "true");
        assert!(exceeds("error", &json!(true), &settings));
    }

    #[test]
    fn test_unknown_keys_never_exceed() {
        let settings = settings();
        for value in [json!(1_000_000), json!(true), json!("x"), json!([1])] {
            assert!(!exceeds("duration_cpu_ms", &value, &settings));
            assert!(!exceeds("name", &value, &settings));
            assert!(!exceeds("http.status_code", &value, &settings));
        }
    }

    #[test]
    fn test_malformed_or_missing_setting() {
        // An unset threshold disables the check rather than acting as 0
        let settings = MemorySettings::new().with(EXECUTION_THRESHOLD_MS, "fast");
        assert!(!exceeds("duration_ms", &json!(1_000_000), &settings));

        let blank = MemorySettings::new().with(EXECUTION_THRESHOLD_MS, "");
        assert!(!exceeds("duration_ms", &json!(150), &blank));

        let empty = MemorySettings::new();
        assert!(!exceeds("duration_ms", &json!(150), &empty));
        assert!(!exceeds("external_requests.jdbc.count", &json!(3), &empty));
    }

    #[test]
    fn test_string_values_are_coerced() {
        assert!(exceeds("duration_ms", &json!("150"), &settings()));
        assert!(!exceeds("duration_ms", &json!("slow"), &settings()));
    }

    #[test]
    fn test_above_setting() {
        assert!(above_setting(101.0, EXECUTION_THRESHOLD_MS, &settings()));
        assert!(!above_setting(99.0, EXECUTION_THRESHOLD_MS, &settings()));
        assert!(!above_setting(99.0, "missing", &settings()));
    }
}
