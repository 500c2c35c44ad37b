// src/codec/params.rs
//
// Parameter cleaning (read) and type-version restoration (write), spec §4.2.

use serde_json::{Map, Value};
use std::collections::HashSet;

const EMPTY_WRAPPER_KEYS: [&str; 2] = ["options", "additionalFields"];
const SENTINELS: [&str; 2] = ["none", "off"];

/// Recursively drop null/empty-string/empty-array/empty-object values, the
/// conventionally-empty wrapper keys when their contents are empty, and the
/// sentinel strings "none"/"off". Arrays are preserved as-is (not recursed
/// into element-wise — spec: "Arrays are preserved as-is"). Guards against
/// reference cycles via a seen-set of object identities is unnecessary for
/// owned `serde_json::Value` trees (no shared references exist), but the
/// walk is still depth-guarded defensively.
pub fn clean_params(value: &Value) -> Option<Value> {
    clean_inner(value, 0)
}

const MAX_DEPTH: usize = 256;

fn clean_inner(value: &Value, depth: usize) -> Option<Value> {
    if depth > MAX_DEPTH {
        return Some(value.clone());
    }
    match value {
        Value::Null => None,
        Value::String(s) => {
            if s.is_empty() || SENTINELS.contains(&s.as_str()) {
                None
            } else {
                Some(Value::String(s.clone()))
            }
        }
        Value::Array(items) => {
            if items.is_empty() {
                None
            } else {
                Some(Value::Array(items.clone()))
            }
        }
        Value::Object(map) => {
            let mut cleaned = Map::new();
            for (k, v) in map {
                if EMPTY_WRAPPER_KEYS.contains(&k.as_str()) {
                    match clean_inner(v, depth + 1) {
                        Some(Value::Object(inner)) if inner.is_empty() => continue,
                        Some(cleaned_v) => {
                            cleaned.insert(k.clone(), cleaned_v);
                        }
                        None => continue,
                    }
                    continue;
                }
                if let Some(cleaned_v) = clean_inner(v, depth + 1) {
                    cleaned.insert(k.clone(), cleaned_v);
                }
            }
            if cleaned.is_empty() {
                None
            } else {
                Some(Value::Object(cleaned))
            }
        }
        other => Some(other.clone()),
    }
}

/// Parameters are round-tripped verbatim on write.
pub fn restore_params(lite_params: &Value) -> Value {
    lite_params.clone()
}

/// Minimum-stable type-versions per known short type, used when a lite node
/// omits `typeVersion` and there is no original raw node to fall back to.
fn minimum_stable_version(short_type: &str) -> f64 {
    match short_type {
        "set" => 3.0,
        "if" => 2.0,
        "switch" => 3.0,
        _ => 1.0,
    }
}

/// Resolve the type-version to write, per the fallback chain in spec §4.2:
/// explicit lite value -> original raw node's value (if updating) -> minimum
/// stable version table -> 1.
pub fn resolve_type_version(
    lite_type_version: Option<f64>,
    original_type_version: Option<f64>,
    short_type: &str,
) -> f64 {
    lite_type_version
        .or(original_type_version)
        .unwrap_or_else(|| minimum_stable_version(short_type))
}

#[allow(dead_code)]
fn unused_seen_guard() -> HashSet<usize> {
    HashSet::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn drops_null_empty_and_sentinels() {
        let input = json!({
            "a": null,
            "b": "",
            "c": "none",
            "d": "off",
            "e": [],
            "f": {},
            "g": "keep me",
        });
        let cleaned = clean_params(&input).unwrap();
        assert_eq!(cleaned, json!({"g": "keep me"}));
    }

    #[test]
    fn drops_empty_wrapper_keys() {
        let input = json!({
            "options": {},
            "additionalFields": {"x": "y"},
            "other": "v",
        });
        let cleaned = clean_params(&input).unwrap();
        assert_eq!(cleaned, json!({"additionalFields": {"x": "y"}, "other": "v"}));
    }

    #[test]
    fn nested_objects_omitted_if_empty_after_clean() {
        let input = json!({
            "outer": {"inner": null},
            "keep": "yes",
        });
        let cleaned = clean_params(&input).unwrap();
        assert_eq!(cleaned, json!({"keep": "yes"}));
    }

    #[test]
    fn arrays_preserved_as_is() {
        let input = json!({"items": [null, "", "x"]});
        let cleaned = clean_params(&input).unwrap();
        assert_eq!(cleaned, json!({"items": [null, "", "x"]}));
    }

    #[test]
    fn type_version_fallback_chain() {
        assert_eq!(resolve_type_version(Some(5.0), Some(2.0), "set"), 5.0);
        assert_eq!(resolve_type_version(None, Some(2.0), "set"), 2.0);
        assert_eq!(resolve_type_version(None, None, "set"), 3.0);
        assert_eq!(resolve_type_version(None, None, "httpRequest"), 1.0);
    }
}
