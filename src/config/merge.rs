//! Deep merge of configuration layers.
//!
//! Mappings are merged key by key; everything else in the overlay replaces the
//! base value outright. Sequences are replaced, not concatenated.

use serde_json::Value;

/// Deep merge two values, with `overlay` taking precedence over `base`.
///
/// - Both mappings: merged recursively, keys only in `base` are kept
/// - Anything else: `overlay` replaces `base`, including a mapping replaced by
///   a scalar (or the reverse) and an explicit `null`
///
/// # Example
/// ```
/// use serde_json::json;
/// use podcast_ingest::config::deep_merge;
///
/// let base = json!({
///     "ingestion": { "poll_interval_seconds": 900, "batch_size": 50 },
///     "feeds": ["a", "b"]
/// });
/// let overlay = json!({
///     "ingestion": { "poll_interval_seconds": 120 },
///     "feeds": ["c"]
/// });
/// let merged = deep_merge(base, overlay);
/// assert_eq!(merged["ingestion"]["poll_interval_seconds"], 120);
/// assert_eq!(merged["ingestion"]["batch_size"], 50);
/// assert_eq!(merged["feeds"], json!(["c"]));
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged_value = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged_value);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Merge layers in order, later layers taking precedence.
///
/// Starts from an empty mapping, so an empty iterator yields `{}`.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values
        .into_iter()
        .fold(Value::Object(Default::default()), deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_simple_objects() {
        let base = json!({"a": 1, "b": 2});
        let overlay = json!({"b": 3, "c": 4});
        let result = deep_merge(base, overlay);
        assert_eq!(result, json!({"a": 1, "b": 3, "c": 4}));
    }

    #[test]
    fn test_merge_nested_objects() {
        let base = json!({
            "ingestion": {"poll_interval_seconds": 900, "user_agent": "bot"},
            "debug": true
        });
        let overlay = json!({
            "ingestion": {"poll_interval_seconds": 60}
        });
        let result = deep_merge(base, overlay);
        assert_eq!(
            result,
            json!({
                "ingestion": {"poll_interval_seconds": 60, "user_agent": "bot"},
                "debug": true
            })
        );
    }

    #[test]
    fn test_arrays_replaced_not_merged() {
        let base = json!({"items": [1, 2, 3]});
        let overlay = json!({"items": [4, 5]});
        let result = deep_merge(base, overlay);
        assert_eq!(result, json!({"items": [4, 5]}));
    }

    #[test]
    fn test_null_replaces_base() {
        let base = json!({"a": 1, "b": {"c": 2}});
        let overlay = json!({"a": null, "b": {"c": null}});
        let result = deep_merge(base, overlay);
        assert_eq!(result, json!({"a": null, "b": {"c": null}}));
    }

    #[test]
    fn test_deep_nested_merge() {
        let base = json!({
            "level1": {"level2": {"level3": {"a": 1, "b": 2}}}
        });
        let overlay = json!({
            "level1": {"level2": {"level3": {"b": 3, "c": 4}}}
        });
        let result = deep_merge(base, overlay);
        assert_eq!(
            result,
            json!({
                "level1": {"level2": {"level3": {"a": 1, "b": 3, "c": 4}}}
            })
        );
    }

    #[test]
    fn test_merge_all_in_order() {
        let values = vec![json!({"a": 1}), json!({"b": 2}), json!({"a": 3, "c": 4})];
        let result = deep_merge_all(values);
        assert_eq!(result, json!({"a": 3, "b": 2, "c": 4}));
    }

    #[test]
    fn test_merge_all_empty_is_empty_mapping() {
        assert_eq!(deep_merge_all(Vec::new()), json!({}));
    }

    #[test]
    fn test_overlay_replaces_primitive_with_object() {
        let base = json!({"value": 42});
        let overlay = json!({"value": {"nested": true}});
        let result = deep_merge(base, overlay);
        assert_eq!(result, json!({"value": {"nested": true}}));
    }

    #[test]
    fn test_overlay_replaces_object_with_primitive() {
        let base = json!({"value": {"nested": true}});
        let overlay = json!({"value": 42});
        let result = deep_merge(base, overlay);
        assert_eq!(result, json!({"value": 42}));
    }

    #[test]
    fn test_base_only_keys_untouched() {
        let base = json!({"keep": {"x": [1, 2]}, "swap": "old"});
        let overlay = json!({"swap": "new"});
        let result = deep_merge(base, overlay);
        assert_eq!(result["keep"], json!({"x": [1, 2]}));
        assert_eq!(result["swap"], "new");
    }
}
