//! `config` subcommand: print the effective configuration.

use crate::config::{ConfigValue, ImmutableConfig};
use crate::format::{OutputFormat, render};
use anyhow::{Result, anyhow};
use clap::{Args, Subcommand};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the merged configuration (defaults, user file, environment)
    Show(ShowArgs),

    /// List the layers that contributed to the configuration
    Sources,
}

/// Arguments for `config show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// Only print the sub-tree at this dotted key (e.g. `ingestion.poll_interval_seconds`)
    #[arg(short, long, value_name = "KEY")]
    pub key: Option<String>,
}

/// Run a config subcommand against an already-loaded configuration.
pub fn run(config: &ImmutableConfig, command: &ConfigCommand) -> Result<String> {
    match command {
        ConfigCommand::Show(args) => show(config, args),
        ConfigCommand::Sources => Ok(sources(config)),
    }
}

fn show(config: &ImmutableConfig, args: &ShowArgs) -> Result<String> {
    match &args.key {
        Some(key) => {
            let value: &ConfigValue = config
                .get_path(key)
                .ok_or_else(|| anyhow!("No configuration value at '{}'", key))?;
            render(value, args.format)
        }
        None => render(config.root(), args.format),
    }
}

fn sources(config: &ImmutableConfig) -> String {
    let mut out = String::new();
    if config.sources().is_empty() {
        out.push_str("(no configuration sources found)\n");
    }
    for source in config.sources() {
        match &source.path {
            Some(path) => out.push_str(&format!(
                "{:<12} {} ({} keys)\n",
                source.tier.to_string(),
                path.display(),
                source.entries
            )),
            None => out.push_str(&format!(
                "{:<12} {} variables\n",
                source.tier.to_string(),
                source.entries
            )),
        }
    }
    out
}
