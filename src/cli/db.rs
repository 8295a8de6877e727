//! `db` subcommand: bootstrap and inspect the ingestion store.

use crate::config::ImmutableConfig;
use crate::db::{DEFAULT_DB_PATH, Store};
use crate::format::{OutputFormat, render};
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Configuration key holding the store path.
pub const DATABASE_PATH_KEY: &str = "ingestion.database_path";

#[derive(Subcommand, Debug)]
pub enum DbCommand {
    /// Create the store and apply pending schema migrations
    Init(InitArgs),

    /// Print the tables, columns and keys of the store
    Schema(SchemaArgs),
}

/// Arguments for `db init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path to the store file (overrides `ingestion.database_path`)
    #[arg(short, long, value_name = "FILE")]
    pub database: Option<PathBuf>,
}

/// Arguments for `db schema`.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Path to the store file (overrides `ingestion.database_path`)
    #[arg(short, long, value_name = "FILE")]
    pub database: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// Include the CREATE statement of each table
    #[arg(long)]
    pub sql: bool,
}

/// Resolve the store path: CLI flag, then configuration, then the default.
pub fn resolve_db_path(explicit: Option<&PathBuf>, config: &ImmutableConfig) -> PathBuf {
    explicit
        .cloned()
        .or_else(|| {
            config
                .get_path(DATABASE_PATH_KEY)
                .and_then(|v| v.as_str())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH))
}

/// Run a db subcommand.
pub fn run(config: &ImmutableConfig, command: &DbCommand) -> Result<String> {
    match command {
        DbCommand::Init(args) => {
            let path = resolve_db_path(args.database.as_ref(), config);
            let store = Store::initialize(&path)
                .with_context(|| format!("Failed to initialize store at {}", path.display()))?;

            let mut out = format!("Store ready at {}\n", path.display());
            for migration in store.applied_migrations()? {
                out.push_str(&format!("  V{}__{}\n", migration.version, migration.name));
            }
            Ok(out)
        }
        DbCommand::Schema(args) => {
            let path = resolve_db_path(args.database.as_ref(), config);
            let store = Store::open(&path)
                .with_context(|| format!("Failed to open store at {}", path.display()))?;
            let schema = store.get_schema(args.sql)?;
            render(&schema, args.format)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use tempfile::TempDir;

    fn config_with_db(temp: &TempDir) -> ImmutableConfig {
        let db_path = temp.path().join("from-config.db");
        load_config(
            temp.path().join("missing-defaults.yaml"),
            temp.path().join("missing-user.yaml"),
            [(
                "APP__INGESTION__DATABASE_PATH".to_string(),
                db_path.display().to_string(),
            )],
            "APP",
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_db_path_precedence() {
        let temp = TempDir::new().unwrap();
        let config = config_with_db(&temp);

        let explicit = PathBuf::from("explicit.db");
        assert_eq!(resolve_db_path(Some(&explicit), &config), explicit);
        assert_eq!(
            resolve_db_path(None, &config),
            temp.path().join("from-config.db")
        );

        let empty = load_config(
            temp.path().join("a.yaml"),
            temp.path().join("b.yaml"),
            Vec::<(String, String)>::new(),
            "APP",
        )
        .unwrap();
        assert_eq!(
            resolve_db_path(None, &empty),
            PathBuf::from(DEFAULT_DB_PATH)
        );
    }

    #[test]
    fn test_init_then_schema() {
        let temp = TempDir::new().unwrap();
        let config = config_with_db(&temp);

        let out = run(&config, &DbCommand::Init(InitArgs { database: None })).unwrap();
        assert!(out.contains("V1__initial_schema"));
        assert!(temp.path().join("from-config.db").exists());

        let out = run(
            &config,
            &DbCommand::Schema(SchemaArgs {
                database: None,
                format: OutputFormat::Json,
                sql: false,
            }),
        )
        .unwrap();
        assert!(out.contains("\"canonical_rss_url\""));
        assert!(!out.contains("refinery_schema_history"));
    }
}
