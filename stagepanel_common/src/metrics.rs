//! Metric metadata and value formatting for the request tab

use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;

/// Trace keys that are never listed as generic metrics.
/// They are either rendered elsewhere (headers, user agent, page load) or hidden.
pub const EXCLUDED_PREFIXES: [&str; 5] = [
    "call_tree_json",
    "http.headers",
    "user_agent",
    "pageLoadTime",
    "jaeger",
];

/// Turns a raw trace value into its display string
pub type Formatter = fn(&Value) -> String;

/// Static metadata for a well-known metric key
#[derive(Debug, Clone, Copy)]
pub enum MetricInfo {
    Plain {
        name: &'static str,
        description: &'static str,
    },
    Formatted {
        name: &'static str,
        description: &'static str,
        formatter: Formatter,
    },
}

impl MetricInfo {
    pub fn name(&self) -> &'static str {
        match self {
            MetricInfo::Plain { name, .. } | MetricInfo::Formatted { name, .. } => *name,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MetricInfo::Plain { description, .. } | MetricInfo::Formatted { description, .. } => {
                *description
            }
        }
    }

    pub fn format(&self, value: &Value) -> String {
        match self {
            MetricInfo::Plain { .. } => display_value(value),
            MetricInfo::Formatted { formatter, .. } => formatter(value),
        }
    }
}

static METRICS: Lazy<HashMap<&'static str, MetricInfo>> = Lazy::new(|| {
    use MetricInfo::{Formatted, Plain};

    HashMap::from([
        ("name", Plain {
            name: "Request name",
            description: "Usecase / Request verb and path",
        }),
        ("duration_ms", Plain {
            name: "Server execution time in ms",
            description: "The time in ms it took to process the request in the server.",
        }),
        ("duration_cpu_ms", Plain {
            name: "Execution time for the CPU",
            description: "The amount of time in ms it took the CPU to process the request.",
        }),
        ("error", Plain {
            name: "Error",
            description: "true, if there was an error while processing the request, false otherwise.",
        }),
        ("exception.class", Plain {
            name: "Exception class",
            description: "The class of the thrown exception. (Only present, if there was a exception)",
        }),
        ("exception.message", Plain {
            name: "Exception message",
            description: "The message of the thrown exception. (Only present, if there was a exception)",
        }),
        ("exception.stack_trace", Plain {
            name: "Exception stack trace",
            description: "",
        }),
        ("stackTrace", Plain {
            name: "Stacktrace",
            description: "The full stack trace of the thrown exception. (Only present, if there was a exception)",
        }),
        ("parameters", Formatted {
            name: "Parameters",
            description: "The query string of the request. You can obfuscate sensitive parameters.",
            formatter: format_pairs,
        }),
        ("clientIp", Plain {
            name: "Client IP",
            description: "The IP of the client who initiated the HTTP request.",
        }),
        ("http.url", Plain {
            name: "URL",
            description: "The requested URL.",
        }),
        ("http.status_code", Plain {
            name: "Status code",
            description: "The HTTP status code of a request.",
        }),
        ("method", Plain {
            name: "Method",
            description: "The HTTP method of the request.",
        }),
        ("@timestamp", Plain {
            name: "Timestamp",
            description: "The date and time the request entered the server.",
        }),
        ("application", Plain {
            name: "Application name",
            description: "The name of the application that handled the request.",
        }),
        ("host", Plain {
            name: "Host accessing",
            description: "The name of the host of the server that handled the request.",
        }),
        ("instance", Plain {
            name: "Instance",
            description: "The name of the instance of the application that handled the request. \
                The instance name is useful if you run different environments of the same \
                application, maybe even on the same host. By default it is the domain name of \
                the server, taken from the first incoming request.",
        }),
        ("externalRequestStats", Formatted {
            name: "Execution time and count of external requests",
            description: "",
            formatter: format_external_request_stats,
        }),
    ])
});

/// Display-ready name, description and value of one metric
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    pub name: String,
    pub description: String,
    pub value: String,
}

/// Look up the static metadata for a key
pub fn lookup(key: &str) -> Option<&'static MetricInfo> {
    METRICS.get(key)
}

/// True if the key's metadata carries its own formatter.
/// Such keys are kept whole during flattening so the formatter sees the full value.
pub fn is_formatted(key: &str) -> bool {
    matches!(lookup(key), Some(MetricInfo::Formatted { .. }))
}

/// True if the key falls under one of the excluded prefixes
pub fn is_excluded(key: &str) -> bool {
    EXCLUDED_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
}

/// Describe a flattened metric
///
/// Unknown keys are named after themselves with an empty description.
pub fn describe(key: &str, value: &Value) -> Description {
    match lookup(key) {
        Some(info) => Description {
            name: info.name().to_string(),
            description: info.description().to_string(),
            value: info.format(value),
        },
        None => Description {
            name: key.to_string(),
            description: String::new(),
            value: display_value(value),
        },
    }
}

/// Generic string form of a trace value
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                n.to_string()
            } else {
                format_number(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Integral numbers print without a fraction, like `150` rather than `150.0`
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// `"k1: v1, k2: v2"` for a mapping such as the query parameters
pub fn format_pairs(value: &Value) -> String {
    match value {
        Value::Object(params) => params
            .iter()
            .map(|(key, value)| format!("{}: {}", key, display_value(value)))
            .collect::<Vec<_>>()
            .join(", "),
        other => display_value(other),
    }
}

/// One block per external request type, blocks separated by a newline
fn format_external_request_stats(value: &Value) -> String {
    let Value::Array(stats) = value else {
        return display_value(value);
    };

    stats
        .iter()
        .map(|stat| {
            let request_type = stat.get("requestType").map(display_value).unwrap_or_default();
            let count = stat.get("executionCount").map(display_value).unwrap_or_default();
            let time = match stat.get("executionTime").and_then(Value::as_f64) {
                Some(ms) => format!("{:.2}", ms),
                None => stat.get("executionTime").map(display_value).unwrap_or_default(),
            };
            format!(
                "{}:\nNumber of requests: {}\nExecution time: {} ms",
                request_type, count, time
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
