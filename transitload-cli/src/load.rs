//! Load command implementation for the transitload CLI.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use transitload_core::{FailurePolicy, LoadReport};
use transitload_feed::{BuildRequest, FeedLayout, build_feed_database};

use crate::{
    ARG_ABORT_ON_ERROR, ARG_DATABASE, ARG_FEED_DIR, ARG_KEEP_EXISTING, ARG_LAYOUT, CliError,
    ENV_DATABASE, ENV_FEED_DIR,
};

/// CLI arguments for the `load` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "load",
    long_about = "Create a SQLite database from a directory of delimited \
                 feed files. Each file is loaded into its table in its own \
                 transaction. Paths can come from CLI flags, configuration \
                 files, or environment variables.",
    about = "Load a feed directory into SQLite"
)]
#[ortho_config(prefix = "TRANSITLOAD")]
pub(crate) struct LoadArgs {
    /// Directory containing the feed's `.txt` files.
    #[arg(long = ARG_FEED_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) feed_dir: Option<Utf8PathBuf>,
    /// SQLite database file to create.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// JSON file describing which files to load and their column order.
    #[arg(long = ARG_LAYOUT, value_name = "path")]
    #[serde(default)]
    pub(crate) layout: Option<Utf8PathBuf>,
    /// Append to an existing database instead of recreating it.
    #[arg(long = ARG_KEEP_EXISTING)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) keep_existing: bool,
    /// Stop at the first file that fails to load.
    #[arg(long = ARG_ABORT_ON_ERROR)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) abort_on_error: bool,
}

impl LoadArgs {
    pub(crate) fn into_config(self) -> Result<LoadConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        LoadConfig::try_from(merged)
    }
}

/// Resolved `load` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadConfig {
    /// Directory holding the feed files.
    pub(crate) feed_dir: Utf8PathBuf,
    /// Database file to write.
    pub(crate) database: Utf8PathBuf,
    /// Optional layout file overriding the conventional feed layout.
    pub(crate) layout: Option<Utf8PathBuf>,
    /// Remove an existing database before loading.
    pub(crate) replace_existing: bool,
    /// What to do after a file fails to load.
    pub(crate) policy: FailurePolicy,
}

impl LoadConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        let feed_dir = &self.feed_dir;
        if !Self::inspect(feed_dir, ARG_FEED_DIR, transitload_fs::is_dir)? {
            return Err(CliError::MissingFeedDir {
                field: ARG_FEED_DIR,
                path: feed_dir.clone(),
            });
        }
        if let Some(layout) = &self.layout
            && !Self::inspect(layout, ARG_LAYOUT, transitload_fs::is_file)?
        {
            return Err(CliError::MissingLayoutFile {
                field: ARG_LAYOUT,
                path: layout.clone(),
            });
        }
        Ok(())
    }

    fn inspect(
        path: &Utf8Path,
        field: &'static str,
        check: fn(&Utf8Path) -> std::io::Result<bool>,
    ) -> Result<bool, CliError> {
        check(path).map_err(|source| CliError::InspectPath {
            field,
            path: path.to_path_buf(),
            source,
        })
    }

    pub(crate) fn build_request(&self) -> Result<BuildRequest, CliError> {
        let layout = match &self.layout {
            Some(path) => FeedLayout::from_json_path(path)?,
            None => FeedLayout::default(),
        };
        Ok(BuildRequest {
            feed_dir: self.feed_dir.clone(),
            database: self.database.clone(),
            layout,
            policy: self.policy,
            replace_existing: self.replace_existing,
        })
    }
}

impl TryFrom<LoadArgs> for LoadConfig {
    type Error = CliError;

    fn try_from(args: LoadArgs) -> Result<Self, Self::Error> {
        let feed_dir = args.feed_dir.ok_or(CliError::MissingArgument {
            field: ARG_FEED_DIR,
            env: ENV_FEED_DIR,
        })?;
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_DATABASE,
        })?;
        let policy = if args.abort_on_error {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Continue
        };
        Ok(Self {
            feed_dir,
            database,
            layout: args.layout,
            replace_existing: !args.keep_existing,
            policy,
        })
    }
}

pub(super) fn run_load(args: LoadArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_load_with(args, &mut stdout)
}

pub(super) fn run_load_with(args: LoadArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = resolve_load_config(args)?;
    execute_load(&config, writer)
}

fn resolve_load_config(args: LoadArgs) -> Result<LoadConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

/// Build the database described by `config`, write the summary, and fail
/// when any file could not be loaded.
pub(super) fn execute_load(config: &LoadConfig, writer: &mut dyn Write) -> Result<(), CliError> {
    let request = config.build_request()?;
    let report = build_feed_database(&request)?;
    write_load_summary(writer, &report, &config.database)?;
    ensure_loaded(&report)
}

fn write_load_summary(
    writer: &mut dyn Write,
    report: &LoadReport,
    database: &Utf8Path,
) -> Result<(), CliError> {
    for entry in report.outcomes() {
        let table = entry.job().table_name();
        match entry.outcome() {
            Ok(result) => {
                writeln!(
                    writer,
                    "{table}: {} inserted, {} rejected, {} skipped",
                    result.rows_inserted(),
                    result.rows_failed(),
                    result.rows_skipped()
                )?;
                for warning in result.warnings() {
                    writeln!(writer, "WARN: {table} {warning}")?;
                }
            }
            Err(err) => writeln!(writer, "{table}: failed: {err}")?,
        }
    }
    for job in report.not_attempted() {
        writeln!(writer, "{}: not attempted", job.table_name())?;
    }
    let totals = report.totals();
    writeln!(
        writer,
        "{database}: {} inserted, {} rejected, {} skipped",
        totals.rows_inserted(),
        totals.rows_failed(),
        totals.rows_skipped()
    )?;
    Ok(())
}

fn ensure_loaded(report: &LoadReport) -> Result<(), CliError> {
    if report.is_success() {
        return Ok(());
    }
    Err(CliError::JobsFailed {
        failed: report.failures().count(),
        not_attempted: report.not_attempted().len(),
    })
}
