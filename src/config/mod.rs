//! Layered configuration.
//!
//! Three tiers are merged, later tiers winning:
//! 1. **Defaults** - `config/defaults.yaml`
//! 2. **User** - `config.yaml` (optional)
//! 3. **Environment** - `PODCAST_THEME_ANALYZER__<SECTION>__<KEY>=<value>`
//!
//! ## Merge Strategy
//! - Mappings are deep-merged key by key
//! - Everything else (scalars, sequences, null) replaces the lower tier
//!
//! The result is frozen into a read-only [`ConfigValue`] tree.

mod env;
mod frozen;
mod loader;
mod merge;
mod yaml;

pub use env::{ENV_SEPARATOR, env_overrides, key_path, parse_scalar};
pub use frozen::{ConfigValue, FrozenMap, FrozenSeq, freeze, freeze_map};
pub use loader::{
    ConfigLoader, ConfigPaths, ConfigSource, ConfigTier, DEFAULTS_PATH, ENV_PREFIX,
    ImmutableConfig, USER_CONFIG_PATH, load_config,
};
pub use merge::{deep_merge, deep_merge_all};
