//! CLI command definitions for podcast-ingest
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod config;
pub mod db;

use crate::config::{ConfigLoader, DEFAULTS_PATH, ENV_PREFIX, USER_CONFIG_PATH};
use clap::{Parser, Subcommand};
use config::ConfigCommand;
use db::DbCommand;
use std::path::PathBuf;

/// Podcast ingestion configuration and store tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the defaults configuration file
    #[arg(long, value_name = "FILE", default_value = DEFAULTS_PATH, global = true)]
    pub defaults: PathBuf,

    /// Path to the user configuration file (optional)
    #[arg(short, long, value_name = "FILE", default_value = USER_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    /// Prefix of environment variables that override configuration keys
    #[arg(long, value_name = "PREFIX", default_value = ENV_PREFIX, global = true)]
    pub env_prefix: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Loader for the configuration files and prefix given on the command line.
    pub fn config_loader(&self) -> ConfigLoader {
        ConfigLoader::new()
            .defaults_path(&self.defaults)
            .user_path(&self.config)
            .env_prefix(&self.env_prefix)
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect the effective configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Initialize or inspect the ingestion store
    #[command(subcommand)]
    Db(DbCommand),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_db_init_with_globals() {
        let cli = Cli::parse_from([
            "podcast-ingest",
            "--env-prefix",
            "APP",
            "db",
            "init",
            "--database",
            "/tmp/x.db",
        ]);
        assert_eq!(cli.env_prefix, "APP");
        assert_eq!(cli.config, PathBuf::from(USER_CONFIG_PATH));
        match cli.command {
            Command::Db(DbCommand::Init(args)) => {
                assert_eq!(args.database, Some(PathBuf::from("/tmp/x.db")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
