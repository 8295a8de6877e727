//! Environment variable overrides.
//!
//! A variable named `<PREFIX>__INGESTION__POLL_INTERVAL_SECONDS=120` becomes the
//! override tree `{"ingestion": {"poll_interval_seconds": 120}}`.

use super::yaml::parse_document;
use serde_json::{Map, Value};
use tracing::trace;

/// Separator between the prefix and each nested key segment.
pub const ENV_SEPARATOR: &str = "__";

/// Build an override tree from environment entries.
///
/// Only entries named `prefix + "__" + ...` are selected. With an empty
/// prefix every entry is selected. Segments are split on `__`, empty segments
/// are dropped and the rest lower-cased. Entries are applied in name order.
pub fn env_overrides<I, K, V>(env: I, prefix: &str) -> Value
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut selected: Vec<(Vec<String>, String)> = env
        .into_iter()
        .filter_map(|(name, value)| {
            let path = key_path(name.as_ref(), prefix)?;
            Some((path, value.as_ref().to_string()))
        })
        .collect();
    selected.sort();

    let mut overrides = Map::new();
    for (path, raw) in selected {
        trace!(key = %path.join("."), "Applying environment override");
        insert_path(&mut overrides, &path, parse_scalar(&raw));
    }
    Value::Object(overrides)
}

/// Split an environment variable name into its lower-cased key path.
///
/// Returns `None` when the name does not carry the prefix or no segments are
/// left after stripping it.
pub fn key_path(name: &str, prefix: &str) -> Option<Vec<String>> {
    let compound = if prefix.is_empty() {
        name
    } else {
        name.strip_prefix(prefix)?.strip_prefix(ENV_SEPARATOR)?
    };

    let segments: Vec<String> = compound
        .split(ENV_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .map(str::to_lowercase)
        .collect();

    if segments.is_empty() {
        None
    } else {
        Some(segments)
    }
}

/// Parse a raw environment value as a YAML literal.
///
/// `"120"` is an integer, `"true"` a boolean, `"[1, 2]"` a sequence and an
/// empty string is null. Anything that is not valid YAML stays a string, and
/// so do `.inf` and `.nan`.
///
/// Scalars follow YAML 1.2, so `yes`, `no`, `on` and `off` are strings rather
/// than booleans.
pub fn parse_scalar(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Null;
    }
    parse_document(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn insert_path(map: &mut Map<String, Value>, path: &[String], value: Value) {
    let Some((leaf, parents)) = path.split_last() else {
        return;
    };

    let mut cursor = map;
    for part in parents {
        let entry = cursor
            .entry(part.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        cursor = match entry {
            Value::Object(inner) => inner,
            _ => unreachable!("entry was just replaced by a mapping"),
        };
    }
    cursor.insert(leaf.clone(), value);
}
