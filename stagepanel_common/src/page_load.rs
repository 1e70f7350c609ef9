//! Breakdown of the client page load into network, server, DOM and render phases

use crate::metrics::format_number;
use crate::setting_keys::EXECUTION_THRESHOLD_MS;
use crate::settings::SettingsStore;
use crate::threshold::above_setting;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Raw browser timings reported with a trace, all in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageLoadTiming {
    pub time_to_first_byte: f64,
    pub server_time: f64,
    pub dom_processing: f64,
    pub page_rendering: f64,
    pub total_page_load_time: f64,
}

impl PageLoadTiming {
    /// Read the `pageLoadTime` section of a trace, if the browser reported one
    pub fn from_trace(trace: &Value) -> Option<Self> {
        let raw = trace.get("pageLoadTime").filter(|v| !v.is_null())?;
        match serde_json::from_value(raw.clone()) {
            Ok(timing) => Some(timing),
            Err(e) => {
                tracing::debug!("Ignoring malformed pageLoadTime: {}", e);
                None
            }
        }
    }
}

/// A percentage held as hundredths so that sums stay exact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Percent(i64);

impl Percent {
    pub const HUNDRED: Percent = Percent(10_000);

    /// `part / total * 100`, rounded to two decimals
    ///
    /// `None` when the ratio is not finite or does not fit in hundredths.
    pub fn of(part: f64, total: f64) -> Option<Self> {
        let hundredths = (part / total * 10_000.0).round();
        if !(hundredths.abs() < i64::MAX as f64) {
            return None;
        }
        Some(Percent(hundredths as i64))
    }

    pub fn from_hundredths(hundredths: i64) -> Self {
        Percent(hundredths)
    }

    pub fn hundredths(&self) -> i64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn checked_add(self, rhs: Percent) -> Option<Percent> {
        self.0.checked_add(rhs.0).map(Percent)
    }

    pub fn checked_sub(self, rhs: Percent) -> Option<Percent> {
        self.0.checked_sub(rhs.0).map(Percent)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Percent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Page-load sub-panel model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLoadModel {
    pub network_ms: f64,
    pub network_percent: Percent,
    pub server_ms: f64,
    pub server_percent: Percent,
    pub server_threshold_exceeded: bool,
    pub dom_processing_ms: f64,
    pub dom_processing_percent: Percent,
    pub page_rendering_ms: f64,
    pub page_rendering_percent: Percent,
    pub total_ms: f64,
    pub total_threshold_exceeded: bool,
}

impl PageLoadModel {
    pub fn threshold_exceeded(&self) -> bool {
        self.server_threshold_exceeded || self.total_threshold_exceeded
    }

    /// Template fields as display strings
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("networkMs", format_number(self.network_ms)),
            ("networkPercent", self.network_percent.to_string()),
            ("serverMs", format_number(self.server_ms)),
            ("serverPercent", self.server_percent.to_string()),
            ("serverClass", exceeded_class(self.server_threshold_exceeded)),
            ("domProcessingMs", format_number(self.dom_processing_ms)),
            ("domProcessingPercent", self.dom_processing_percent.to_string()),
            ("pageRenderingMs", format_number(self.page_rendering_ms)),
            ("pageRenderingPercent", self.page_rendering_percent.to_string()),
            ("totalMs", format_number(self.total_ms)),
            ("totalClass", exceeded_class(self.total_threshold_exceeded)),
        ]
    }
}

fn exceeded_class(exceeded: bool) -> String {
    if exceeded { "threshold-exceeded" } else { "" }.to_string()
}

/// Compute the page-load breakdown
///
/// Returns `None` when no timings were collected, when the total is not a
/// positive number, or when a phase is so far out of proportion to the
/// total that its percentage cannot be represented. Rendering time is the
/// remainder so the four percentages always add up to 100.
pub fn compute<S: SettingsStore + ?Sized>(
    raw: Option<&PageLoadTiming>,
    settings: &S,
) -> Option<PageLoadModel> {
    let raw = raw?;
    let total = raw.total_page_load_time;
    if !total.is_finite() || total <= 0.0 {
        tracing::debug!("Skipping page load breakdown, total is {}", total);
        return None;
    }

    let network_ms = raw.time_to_first_byte - raw.server_time;
    let percents = Percent::of(network_ms, total)
        .zip(Percent::of(raw.server_time, total))
        .zip(Percent::of(raw.dom_processing, total));
    let Some(((network_percent, server_percent), dom_processing_percent)) = percents else {
        tracing::debug!("Skipping page load breakdown, phases out of range for total {}", total);
        return None;
    };
    let Some(page_rendering_percent) = Percent::HUNDRED
        .checked_sub(network_percent)
        .and_then(|p| p.checked_sub(server_percent))
        .and_then(|p| p.checked_sub(dom_processing_percent))
    else {
        tracing::debug!("Skipping page load breakdown, rendering share overflows");
        return None;
    };

    Some(PageLoadModel {
        network_ms,
        network_percent,
        server_ms: raw.server_time,
        server_percent,
        server_threshold_exceeded: above_setting(raw.server_time, EXECUTION_THRESHOLD_MS, settings),
        dom_processing_ms: raw.dom_processing,
        dom_processing_percent,
        page_rendering_ms: raw.page_rendering,
        page_rendering_percent,
        total_ms: total,
        total_threshold_exceeded: above_setting(total, EXECUTION_THRESHOLD_MS, settings),
    })
}
