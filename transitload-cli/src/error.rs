//! Error types emitted by the transitload CLI.
//!
//! Keep this error type reasonably small, as CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use transitload_feed::{FeedBuildError, FeedLayoutError};

/// Errors emitted by the transitload CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Long flag name of the option.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// The feed directory does not exist or is not a directory.
    #[error("{field} path {path:?} does not exist or is not a directory")]
    MissingFeedDir {
        /// Long flag name of the option.
        field: &'static str,
        /// Configured path.
        path: Utf8PathBuf,
    },
    /// The layout file does not exist or is not a file.
    #[error("{field} path {path:?} does not exist or is not a file")]
    MissingLayoutFile {
        /// Long flag name of the option.
        field: &'static str,
        /// Configured path.
        path: Utf8PathBuf,
    },
    /// A configured path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectPath {
        /// Long flag name of the option.
        field: &'static str,
        /// Configured path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The layout file could not be read or was invalid.
    #[error("failed to load feed layout: {0}")]
    Layout(#[from] FeedLayoutError),
    /// The database could not be prepared or the feed could not be read.
    #[error(transparent)]
    Build(#[from] FeedBuildError),
    /// Writing the load summary failed.
    #[error("failed to write load summary: {source}")]
    WriteSummary {
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// At least one file could not be loaded.
    #[error("{failed} feed file(s) failed to load; {not_attempted} not attempted")]
    JobsFailed {
        /// Jobs that stopped on a fatal error.
        failed: usize,
        /// Jobs skipped after an aborting failure.
        not_attempted: usize,
    },
}

impl From<std::io::Error> for CliError {
    fn from(source: std::io::Error) -> Self {
        Self::WriteSummary { source }
    }
}
