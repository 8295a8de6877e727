//! YAML documents to merge trees.
//!
//! Documents are parsed into `serde_yaml::Value` first so `<<` merge keys can
//! be expanded, then converted to `serde_json::Value`. The conversion refuses
//! values the merge tree cannot hold instead of turning them into null.

use serde_json::{Map, Number, Value};
use serde_yaml::Value as Yaml;

/// Parse a YAML document, expand merge keys and convert it to a merge tree.
///
/// Scalars follow YAML 1.2: `yes`, `no`, `on` and `off` are strings.
pub(crate) fn parse_document(content: &str) -> Result<Value, String> {
    let mut yaml: Yaml = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
    yaml.apply_merge().map_err(|e| e.to_string())?;
    to_json(yaml, "")
}

fn to_json(value: Yaml, at: &str) -> Result<Value, String> {
    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => Value::Number(number(&n, at)?),
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| to_json(item, &child(at, &i.to_string())))
                .collect::<Result<_, _>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, item) in mapping {
                let key = mapping_key(key, at)?;
                let item = to_json(item, &child(at, &key))?;
                map.insert(key, item);
            }
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => to_json(tagged.value, at)?,
    })
}

fn number(n: &serde_yaml::Number, at: &str) -> Result<Number, String> {
    if let Some(i) = n.as_i64() {
        return Ok(i.into());
    }
    if let Some(u) = n.as_u64() {
        return Ok(u.into());
    }
    let f = n.as_f64().unwrap_or(f64::NAN);
    Number::from_f64(f).ok_or_else(|| format!("non-finite number {n} at '{}'", display(at)))
}

fn mapping_key(key: Yaml, at: &str) -> Result<String, String> {
    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Null => Ok("null".to_string()),
        _ => Err(format!("mapping keys must be scalars at '{}'", display(at))),
    }
}

fn child(at: &str, key: &str) -> String {
    if at.is_empty() {
        key.to_string()
    } else {
        format!("{at}.{key}")
    }
}

fn display(at: &str) -> &str {
    if at.is_empty() { "<root>" } else { at }
}
