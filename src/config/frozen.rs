//! Read-only configuration tree.
//!
//! The merged `serde_json::Value` is walked once and rebuilt from shared,
//! immutable containers. Nothing in this module hands out `&mut` access to a
//! node; the `try_*` write methods exist only to report
//! [`Error::ImmutabilityViolation`].

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

static NULL: ConfigValue = ConfigValue::Null;

/// A node of the frozen configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(FrozenSeq),
    Mapping(FrozenMap),
}

/// Read-only mapping from key to [`ConfigValue`].
#[derive(Clone, PartialEq, Default)]
pub struct FrozenMap(Arc<BTreeMap<String, ConfigValue>>);

/// Read-only ordered sequence of [`ConfigValue`].
#[derive(Clone, PartialEq, Default)]
pub struct FrozenSeq(Arc<[ConfigValue]>);

/// Recursively freeze a merged value.
pub fn freeze(value: Value) -> ConfigValue {
    match value {
        Value::Null => ConfigValue::Null,
        Value::Bool(b) => ConfigValue::Bool(b),
        Value::Number(n) => ConfigValue::Number(n),
        Value::String(s) => ConfigValue::String(s),
        Value::Array(items) => {
            ConfigValue::Sequence(FrozenSeq(items.into_iter().map(freeze).collect()))
        }
        Value::Object(map) => ConfigValue::Mapping(freeze_map(map)),
    }
}

/// Freeze a mapping root.
pub fn freeze_map(map: Map<String, Value>) -> FrozenMap {
    FrozenMap(Arc::new(
        map.into_iter().map(|(k, v)| (k, freeze(v))).collect(),
    ))
}

impl ConfigValue {
    /// Look up a key; `None` for missing keys or non-mapping nodes.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.as_mapping()?.get(key)
    }

    /// Look up a dotted path such as `ingestion.poll_interval_seconds`.
    pub fn get_path(&self, path: &str) -> Option<&ConfigValue> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |node, segment| node.get(segment))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&FrozenSeq> {
        match self {
            ConfigValue::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&FrozenMap> {
        match self {
            ConfigValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Copy the tree into a mutable `serde_json::Value`.
    pub fn to_json(&self) -> Value {
        match self {
            ConfigValue::Null => Value::Null,
            ConfigValue::Bool(b) => Value::Bool(*b),
            ConfigValue::Number(n) => Value::Number(n.clone()),
            ConfigValue::String(s) => Value::String(s.clone()),
            ConfigValue::Sequence(seq) => seq.to_json(),
            ConfigValue::Mapping(map) => map.to_json(),
        }
    }

    /// Deserialize the tree into a typed structure.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.to_json())?)
    }
}

impl FrozenMap {
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.0.get(key)
    }

    pub fn get_path(&self, path: &str) -> Option<&ConfigValue> {
        let mut segments = path.split('.').filter(|segment| !segment.is_empty());
        let first = self.get(segments.next()?)?;
        segments.try_fold(first, |node, segment| node.get(segment))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Always fails: the mapping cannot be written to.
    pub fn try_insert(&self, key: &str, _value: ConfigValue) -> Result<()> {
        Err(Error::immutable(key))
    }

    /// Always fails: the mapping cannot be written to.
    pub fn try_remove(&self, key: &str) -> Result<ConfigValue> {
        Err(Error::immutable(key))
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.to_json())?)
    }
}

impl FrozenSeq {
    pub fn get(&self, index: usize) -> Option<&ConfigValue> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConfigValue> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Always fails: the sequence cannot be written to.
    pub fn try_push(&self, _value: ConfigValue) -> Result<()> {
        Err(Error::immutable(format!("[{}]", self.0.len())))
    }

    pub fn to_json(&self) -> Value {
        Value::Array(self.0.iter().map(ConfigValue::to_json).collect())
    }
}

impl Index<&str> for ConfigValue {
    type Output = ConfigValue;

    fn index(&self, key: &str) -> &ConfigValue {
        self.get(key).unwrap_or(&NULL)
    }
}

impl Index<usize> for ConfigValue {
    type Output = ConfigValue;

    fn index(&self, index: usize) -> &ConfigValue {
        self.as_sequence()
            .and_then(|seq| seq.get(index))
            .unwrap_or(&NULL)
    }
}

impl Index<&str> for FrozenMap {
    type Output = ConfigValue;

    fn index(&self, key: &str) -> &ConfigValue {
        self.get(key).unwrap_or(&NULL)
    }
}

impl Index<usize> for FrozenSeq {
    type Output = ConfigValue;

    fn index(&self, index: usize) -> &ConfigValue {
        self.get(index).unwrap_or(&NULL)
    }
}

impl<'a> IntoIterator for &'a FrozenSeq {
    type Item = &'a ConfigValue;
    type IntoIter = std::slice::Iter<'a, ConfigValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for FrozenMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl fmt::Debug for FrozenSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

// Scalar comparisons so callers can write `config["a"]["b"] == 120`.

macro_rules! partial_eq_int {
    ($($ty:ty)*) => {
        $(
            impl PartialEq<$ty> for ConfigValue {
                fn eq(&self, other: &$ty) -> bool {
                    match self {
                        ConfigValue::Number(n) => match (n.as_i64(), i64::try_from(*other)) {
                            (Some(a), Ok(b)) => a == b,
                            _ => matches!(
                                (n.as_u64(), u64::try_from(*other)),
                                (Some(a), Ok(b)) if a == b
                            ),
                        },
                        _ => false,
                    }
                }
            }
        )*
    };
}

partial_eq_int!(i32 i64 u32 u64 usize);

impl PartialEq<f64> for ConfigValue {
    fn eq(&self, other: &f64) -> bool {
        self.as_f64() == Some(*other)
    }
}

impl PartialEq<bool> for ConfigValue {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

impl PartialEq<&str> for ConfigValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ConfigValue::Null => serializer.serialize_unit(),
            ConfigValue::Bool(b) => serializer.serialize_bool(*b),
            ConfigValue::Number(n) => n.serialize(serializer),
            ConfigValue::String(s) => serializer.serialize_str(s),
            ConfigValue::Sequence(seq) => seq.serialize(serializer),
            ConfigValue::Mapping(map) => map.serialize(serializer),
        }
    }
}

impl Serialize for FrozenMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter())
    }
}

impl Serialize for FrozenSeq {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn sample() -> ConfigValue {
        freeze(json!({
            "runtime": {"environment": "development"},
            "ingestion": {"poll_interval_seconds": 900, "feeds": ["a", "b"]},
            "enabled": true
        }))
    }

    #[test]
    fn test_index_reads_nested_values() {
        let config = sample();
        assert_eq!(config["runtime"]["environment"], "development");
        assert_eq!(config["ingestion"]["poll_interval_seconds"], 900);
        assert_eq!(config["ingestion"]["feeds"][1], "b");
        assert_eq!(config["enabled"], true);
    }

    #[test]
    fn test_missing_keys_index_to_null() {
        let config = sample();
        assert!(config["nope"]["deeper"].is_null());
        assert!(config["enabled"]["not_a_map"].is_null());
        assert!(config["ingestion"]["feeds"][7].is_null());
    }

    #[test]
    fn test_get_path() {
        let config = sample();
        assert_eq!(
            config.get_path("ingestion.poll_interval_seconds"),
            Some(&ConfigValue::Number(900.into()))
        );
        assert!(config.get_path("ingestion.missing").is_none());
        let map = config.as_mapping().unwrap();
        assert_eq!(map.get_path("runtime.environment").unwrap(), &"development");
    }

    #[test]
    fn test_writes_are_rejected() {
        let config = sample();
        let map = config.as_mapping().unwrap();

        let err = map
            .try_insert("runtime", ConfigValue::String("production".into()))
            .unwrap_err();
        assert!(matches!(err, Error::ImmutabilityViolation { ref key } if key == "runtime"));
        assert!(map.try_remove("runtime").is_err());

        let feeds = config["ingestion"]["feeds"].as_sequence().unwrap();
        assert!(feeds.try_push(ConfigValue::Null).is_err());

        // Unchanged after the failed writes.
        assert_eq!(config["runtime"]["environment"], "development");
        assert_eq!(feeds.len(), 2);
    }

    #[test]
    fn test_clones_share_storage() {
        let config = sample();
        let copy = config.clone();
        let (ConfigValue::Mapping(a), ConfigValue::Mapping(b)) = (&config, &copy) else {
            panic!("root should be a mapping");
        };
        assert!(Arc::ptr_eq(&a.0, &b.0));
    }

    #[test]
    fn test_to_json_roundtrips_shape() {
        let source = json!({"a": [1, {"b": null}], "c": "d"});
        assert_eq!(freeze(source.clone()).to_json(), source);
    }

    #[test]
    fn test_deserialize_into_struct() {
        #[derive(Deserialize)]
        struct Ingestion {
            poll_interval_seconds: u64,
            feeds: Vec<String>,
        }

        let config = sample();
        let ingestion: Ingestion = config["ingestion"].deserialize().unwrap();
        assert_eq!(ingestion.poll_interval_seconds, 900);
        assert_eq!(ingestion.feeds, vec!["a", "b"]);
    }

    #[test]
    fn test_serializes_like_source() {
        let config = sample();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["ingestion"]["feeds"], json!(["a", "b"]));
    }
}
