//! Podcast ingestion bootstrap library
//!
//! Layered configuration loading and the ingestion store schema bootstrap.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;

pub use config::{ConfigLoader, ConfigValue, ImmutableConfig, load_config};
pub use db::{Store, initialize_store, open_store};
pub use error::{Error, ErrorCode, Result};
