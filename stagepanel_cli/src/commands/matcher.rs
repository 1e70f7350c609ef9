//! Filter a list of metric names by name and tags

use anyhow::{Context, Result};
use stagepanel_common::utils::{matches, metric_as_string};
use stagepanel_common::{MetricMatcher, MetricName};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Print every metric in `file` (a JSON array of `{name, tags}`) matching the filter
pub fn run(file: &Path, name: Option<String>, tags: Vec<(String, String)>, value_type: &str) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read metrics file {}", file.display()))?;
    let metrics: Vec<MetricName> =
        serde_json::from_str(&content).context("Metrics file must be a JSON array of {name, tags}")?;

    let matcher = MetricMatcher {
        name,
        tags: tags.into_iter().collect::<BTreeMap<_, _>>(),
    };

    let matching = filter(&metrics, &matcher, value_type);
    if matching.is_empty() {
        println!("No matching metrics.");
    }
    for line in matching {
        println!("{}", line);
    }

    Ok(())
}

fn filter(metrics: &[MetricName], matcher: &MetricMatcher, value_type: &str) -> Vec<String> {
    metrics
        .iter()
        .filter(|metric| matches(metric, matcher))
        .map(|metric| metric_as_string(metric, value_type))
        .collect()
}

/// Parse a `key=value` tag filter
pub fn parse_tag(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("Expected KEY=VALUE, got '{}'", s))
}
