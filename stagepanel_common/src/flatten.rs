//! Flattening of nested request traces into dot-joined metric keys

use serde_json::{Map, Value};

/// Deepest nesting level that is descended into.
/// Subtrees below it are dropped with a warning.
pub const MAX_DEPTH: usize = 64;

/// Flatten a trace into `(path, value)` pairs
///
/// Nested mappings are walked depth-first in key order and their keys
/// joined with `.`. Arrays are kept whole as leaf values, nulls are
/// omitted. A trace that is not a mapping flattens to nothing.
pub fn flatten(trace: &Value) -> Vec<(String, Value)> {
    flatten_with(trace, |_| false)
}

/// Flatten a trace, keeping any mapping whose path satisfies `is_leaf` whole
pub fn flatten_with<F>(trace: &Value, is_leaf: F) -> Vec<(String, Value)>
where
    F: Fn(&str) -> bool,
{
    let mut entries = Vec::new();
    if let Value::Object(map) = trace {
        walk(map, None, 0, &is_leaf, &mut entries);
    }
    entries
}

fn walk<F>(
    map: &Map<String, Value>,
    parent: Option<&str>,
    depth: usize,
    is_leaf: &F,
    entries: &mut Vec<(String, Value)>,
) where
    F: Fn(&str) -> bool,
{
    for (key, value) in map {
        let path = match parent {
            Some(parent) => format!("{}.{}", parent, key),
            None => key.clone(),
        };

        match value {
            Value::Null => {}
            Value::Object(nested) if !is_leaf(&path) => {
                if depth + 1 >= MAX_DEPTH {
                    tracing::warn!(path = %path, "Trace nested deeper than {} levels, dropping subtree", MAX_DEPTH);
                    continue;
                }
                walk(nested, Some(&path), depth + 1, is_leaf, entries);
            }
            _ => entries.push((path, value.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(entries: &[(String, Value)]) -> Vec<&str> {
        entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[test]
    fn test_nested_and_null() {
        let entries = flatten(&json!({"a": {"b": 1, "c": null}, "d": 2}));
        assert_eq!(
            entries,
            vec![("a.b".to_string(), json!(1)), ("d".to_string(), json!(2))]
        );
    }

    #[test]
    fn test_key_order_is_preserved() {
        let trace = json!({
            "name": "GET /",
            "http": {"url": "/", "status_code": 200},
            "duration_ms": 12,
            "error": false
        });
        let entries = flatten(&trace);
        assert_eq!(
            keys(&entries),
            vec!["name", "http.url", "http.status_code", "duration_ms", "error"]
        );
    }

    #[test]
    fn test_arrays_are_leaves() {
        let trace = json!({
            "externalRequestStats": [{"requestType": "jdbc", "executionCount": 2, "executionTime": 1.5}]
        });
        let entries = flatten(&trace);
        assert_eq!(keys(&entries), vec!["externalRequestStats"]);
        assert!(entries[0].1.is_array());
    }

    #[test]
    fn test_falsy_scalars_are_kept() {
        let entries = flatten(&json!({"zero": 0, "no": false, "empty": "", "obj": {}}));
        assert_eq!(keys(&entries), vec!["zero", "no", "empty"]);
    }

    #[test]
    fn test_only_scalars_emitted() {
        let trace = json!({
            "a": {"b": {"c": {"d": "x"}}, "e": [1, 2]},
            "f": {"g": null, "h": true}
        });
        for (_, value) in flatten(&trace) {
            assert!(!value.is_object());
            assert!(!value.is_null());
        }
    }

    #[test]
    fn test_leaf_predicate_keeps_mapping() {
        let trace = json!({"parameters": {"q": "rust", "page": "2"}, "http": {"url": "/search"}});
        let entries = flatten_with(&trace, |path| path == "parameters");
        assert_eq!(keys(&entries), vec!["parameters", "http.url"]);
        assert_eq!(entries[0].1, json!({"q": "rust", "page": "2"}));
    }

    #[test]
    fn test_non_object_trace() {
        assert!(flatten(&json!([1, 2, 3])).is_empty());
        assert!(flatten(&json!("trace")).is_empty());
        assert!(flatten(&Value::Null).is_empty());
    }

    fn nested(levels: usize) -> Value {
        let mut value = json!({"leaf": 1});
        for _ in 0..levels {
            value = json!({ "n": value });
        }
        value
    }

    #[test]
    fn test_depth_guard() {
        let shallow = flatten(&nested(10));
        assert_eq!(shallow.len(), 1);
        assert_eq!(shallow[0].0, format!("{}leaf", "n.".repeat(10)));

        assert!(flatten(&nested(MAX_DEPTH + 10)).is_empty());
    }
}
