//! Building a feed database from a feed directory.
#![forbid(unsafe_code)]

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use rusqlite::{Connection, Error as SqliteError};
use thiserror::Error;
use transitload_core::{FailurePolicy, LoadReport, load_all};

use crate::{FeedLayout, FeedLayoutError, FeedSchemaError, initialise_schema};

/// Errors raised while preparing or loading a feed database.
///
/// Row and job problems are not errors; they are recorded in the returned
/// [`LoadReport`].
#[derive(Debug, Error)]
pub enum FeedBuildError {
    /// The feed directory does not exist or is not a directory.
    #[error("feed directory {path} does not exist or is not a directory")]
    MissingFeedDir {
        /// Requested feed directory.
        path: Utf8PathBuf,
    },
    /// A path could not be inspected.
    #[error("failed to inspect {path}: {source}")]
    Inspect {
        /// Inspected path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The previous database could not be removed.
    #[error("failed to remove existing database {path}: {source}")]
    Reset {
        /// Database file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The database directory could not be created.
    #[error("failed to create directory for database {path}: {source}")]
    CreateParent {
        /// Database file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// SQLite could not open the database.
    #[error("failed to open SQLite database at {path}: {source}")]
    Open {
        /// Database file.
        path: Utf8PathBuf,
        /// Underlying SQLite error.
        #[source]
        source: SqliteError,
    },
    /// The schema could not be created.
    #[error(transparent)]
    Schema(#[from] FeedSchemaError),
    /// The layout could not produce load jobs.
    #[error(transparent)]
    Layout(#[from] FeedLayoutError),
}

/// Everything needed to build a feed database in one call.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Directory holding the feed files.
    pub feed_dir: Utf8PathBuf,
    /// SQLite database file to write.
    pub database: Utf8PathBuf,
    /// Files to load and their column order.
    pub layout: FeedLayout,
    /// What to do after a job fails.
    pub policy: FailurePolicy,
    /// Remove an existing database before loading.
    pub replace_existing: bool,
}

impl BuildRequest {
    /// Request with the default layout and policy that replaces any existing
    /// database.
    #[must_use]
    pub fn new(feed_dir: impl Into<Utf8PathBuf>, database: impl Into<Utf8PathBuf>) -> Self {
        Self {
            feed_dir: feed_dir.into(),
            database: database.into(),
            layout: FeedLayout::default(),
            policy: FailurePolicy::default(),
            replace_existing: true,
        }
    }
}

/// Remove the database file at `path`.
///
/// Returns whether a file was removed; a missing file is not an error.
pub fn reset_database(path: &Utf8Path) -> Result<bool, FeedBuildError> {
    let removed =
        transitload_fs::remove_file_if_exists(path).map_err(|source| FeedBuildError::Reset {
            path: path.to_path_buf(),
            source,
        })?;
    if removed {
        info!("removed existing database {path}");
    }
    Ok(removed)
}

/// Open or create the database at `path`, creating missing parent
/// directories.
pub fn open_database(path: &Utf8Path) -> Result<Connection, FeedBuildError> {
    transitload_fs::ensure_parent_dir(path).map_err(|source| FeedBuildError::CreateParent {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("opening database {path}");
    Connection::open(path.as_std_path()).map_err(|source| FeedBuildError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Load every file of the feed in `feed_dir` into `connection`.
///
/// The schema must already exist. Each file is loaded in its own
/// transaction, in layout order.
pub fn load_feed(
    feed_dir: &Utf8Path,
    connection: &mut Connection,
    layout: &FeedLayout,
    policy: FailurePolicy,
) -> Result<LoadReport, FeedBuildError> {
    let is_dir = transitload_fs::is_dir(feed_dir).map_err(|source| FeedBuildError::Inspect {
        path: feed_dir.to_path_buf(),
        source,
    })?;
    if !is_dir {
        return Err(FeedBuildError::MissingFeedDir {
            path: feed_dir.to_path_buf(),
        });
    }

    let jobs = layout.jobs(feed_dir)?;
    let report = load_all(&jobs, connection, policy);
    info!(
        "loaded feed {feed_dir}: {} rows inserted, {} rejected, {} jobs failed",
        report.rows_inserted(),
        report.rows_failed(),
        report.failures().count()
    );
    Ok(report)
}

/// Build a feed database from scratch.
///
/// Removes the existing database when requested, opens it, creates the
/// schema and loads the feed.
///
/// # Examples
///
/// ```no_run
/// use transitload_feed::{BuildRequest, build_feed_database};
///
/// # fn main() -> Result<(), transitload_feed::FeedBuildError> {
/// let report = build_feed_database(&BuildRequest::new("feeds/njt", "out/njt.db"))?;
/// println!("{} rows inserted", report.rows_inserted());
/// # Ok(())
/// # }
/// ```
pub fn build_feed_database(request: &BuildRequest) -> Result<LoadReport, FeedBuildError> {
    if request.replace_existing {
        reset_database(&request.database)?;
    }
    let mut connection = open_database(&request.database)?;
    initialise_schema(&mut connection)?;
    load_feed(
        &request.feed_dir,
        &mut connection,
        &request.layout,
        request.policy,
    )
}
