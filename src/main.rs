//! podcast-ingest
//!
//! Command-line wrapper around the configuration loader and the store
//! bootstrapper.

use anyhow::Result;
use clap::Parser;
use podcast_ingest::cli::{Cli, Command, config as config_cmd, db as db_cmd};
use podcast_ingest::logging::{self, LogTarget};
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let config = cli.config_loader().load()?;
    for source in config.sources() {
        debug!(tier = %source.tier, entries = source.entries, "Configuration source");
    }

    let output = match &cli.command {
        Command::Config(command) => config_cmd::run(&config, command)?,
        Command::Db(command) => db_cmd::run(&config, command)?,
    };
    print!("{}", output);

    Ok(())
}
