//! Command-line interface for loading transit feeds into SQLite.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod load;

pub use error::CliError;

use load::{LoadArgs, run_load};

const ARG_FEED_DIR: &str = "feed-dir";
const ARG_DATABASE: &str = "database";
const ARG_LAYOUT: &str = "layout";
const ARG_KEEP_EXISTING: &str = "keep-existing";
const ARG_ABORT_ON_ERROR: &str = "abort-on-error";
const ENV_FEED_DIR: &str = "TRANSITLOAD_CMDS_LOAD_FEED_DIR";
const ENV_DATABASE: &str = "TRANSITLOAD_CMDS_LOAD_DATABASE";

/// Run the transitload CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Load(args) => run_load(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "transitload",
    about = "Bulk-load delimited transit feed files into SQLite",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build a SQLite database from a feed directory.
    Load(LoadArgs),
}

#[cfg(test)]
mod tests;
