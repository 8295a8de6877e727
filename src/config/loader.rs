//! Configuration loader with tier-based merging.
//!
//! Loads the defaults file, the user file and environment overrides, merges
//! them in that order and freezes the result.

use super::env::env_overrides;
use super::frozen::{FrozenMap, freeze_map};
use super::merge::deep_merge_all;
use super::yaml::parse_document;
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default location of the base configuration document.
pub const DEFAULTS_PATH: &str = "config/defaults.yaml";

/// Default location of the optional user override document.
pub const USER_CONFIG_PATH: &str = "config.yaml";

/// Default prefix selecting environment overrides.
pub const ENV_PREFIX: &str = "PODCAST_THEME_ANALYZER";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Base defaults file (lowest priority)
    Defaults = 0,
    /// Optional user override file
    User = 1,
    /// Environment variables (highest priority)
    Environment = 2,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// A layer that contributed to the loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub tier: ConfigTier,
    /// File the layer was read from (None for the environment tier)
    pub path: Option<PathBuf>,
    /// Number of top-level keys (file tiers) or variables (environment tier)
    pub entries: usize,
}

/// File locations for the two file tiers.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub defaults: PathBuf,
    pub user: PathBuf,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self {
            defaults: PathBuf::from(DEFAULTS_PATH),
            user: PathBuf::from(USER_CONFIG_PATH),
        }
    }
}

/// The merged, frozen configuration together with where it came from.
#[derive(Debug, Clone)]
pub struct ImmutableConfig {
    root: FrozenMap,
    sources: Vec<ConfigSource>,
}

impl ImmutableConfig {
    /// The frozen root mapping.
    pub fn root(&self) -> &FrozenMap {
        &self.root
    }

    /// Layers that contributed, lowest priority first.
    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }
}

impl Deref for ImmutableConfig {
    type Target = FrozenMap;

    fn deref(&self) -> &FrozenMap {
        &self.root
    }
}

/// Configuration loader.
///
/// ```no_run
/// use podcast_ingest::config::ConfigLoader;
///
/// let config = ConfigLoader::new().load()?;
/// let interval = config["ingestion"]["poll_interval_seconds"].as_i64();
/// # Ok::<(), podcast_ingest::error::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    paths: ConfigPaths,
    /// Explicit environment; `None` reads the process environment
    env: Option<BTreeMap<String, String>>,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            paths: ConfigPaths::default(),
            env: None,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    pub fn defaults_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.defaults = path.into();
        self
    }

    pub fn user_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.user = path.into();
        self
    }

    /// Use the given variables instead of the process environment.
    pub fn env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load, merge and freeze all tiers.
    pub fn load(&self) -> Result<ImmutableConfig> {
        let mut layers: Vec<Value> = Vec::new();
        let mut sources = Vec::new();

        for (tier, path) in [
            (ConfigTier::Defaults, &self.paths.defaults),
            (ConfigTier::User, &self.paths.user),
        ] {
            if let Some(map) = read_yaml_mapping(path)? {
                debug!(tier = %tier, path = %path.display(), keys = map.len(), "Loaded config layer");
                sources.push(ConfigSource {
                    tier,
                    path: Some(path.clone()),
                    entries: map.len(),
                });
                layers.push(Value::Object(map));
            } else {
                debug!(tier = %tier, path = %path.display(), "Config file not found, skipping");
            }
        }

        let env = match &self.env {
            Some(vars) => vars.clone(),
            None => process_env(),
        };
        let env_count = env
            .keys()
            .filter(|name| super::env::key_path(name, &self.env_prefix).is_some())
            .count();
        if env_count > 0 {
            debug!(prefix = %self.env_prefix, count = env_count, "Applying environment overrides");
            sources.push(ConfigSource {
                tier: ConfigTier::Environment,
                path: None,
                entries: env_count,
            });
            layers.push(env_overrides(env, &self.env_prefix));
        }

        let root = match deep_merge_all(layers) {
            Value::Object(map) => freeze_map(map),
            // Every layer is a mapping, so the merge is too.
            _ => FrozenMap::default(),
        };

        Ok(ImmutableConfig { root, sources })
    }
}

/// Load configuration from explicit locations.
///
/// Missing files count as empty mappings. Environment entries named
/// `<env_prefix>__A__B` override key `a.b`.
pub fn load_config<I, K, V>(
    defaults_path: impl Into<PathBuf>,
    user_path: impl Into<PathBuf>,
    env: I,
    env_prefix: &str,
) -> Result<ImmutableConfig>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    ConfigLoader::new()
        .defaults_path(defaults_path)
        .user_path(user_path)
        .env_vars(env)
        .env_prefix(env_prefix)
        .load()
}

/// Read a YAML document whose root must be a mapping.
///
/// Returns `Ok(None)` when the file does not exist. An empty or `null`
/// document is an empty mapping. Merge keys are expanded and non-finite
/// numbers are a parse error.
fn read_yaml_mapping(path: &Path) -> Result<Option<Map<String, Value>>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(Error::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if content.trim().is_empty() {
        return Ok(Some(Map::new()));
    }

    let value = parse_document(&content).map_err(|message| Error::parse(path, message))?;

    match value {
        Value::Object(map) => Ok(Some(map)),
        Value::Null => Ok(Some(Map::new())),
        other => Err(Error::parse(
            path,
            format!("expected a mapping at the document root, got {}", kind_of(&other)),
        )),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

fn process_env() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}
