//! Facade crate for the transitload bulk loader.
//!
//! This crate re-exports the record parser, load jobs and loader, and exposes
//! the SQLite store and transit feed database builder behind feature flags.

#![forbid(unsafe_code)]

pub use transitload_core::{
    DEFAULT_DELIMITER, FailurePolicy, FailureScope, InsertStatement, JobOutcome, LoadError,
    LoadJob, LoadJobError, LoadReport, LoadResult, LoadStatus, PreparedInsert, Record,
    RecordStore, RowWarning, StoreFailure, WarningKind, load, load_all, parse_line,
};

#[cfg(feature = "feed")]
pub use transitload_feed::{
    BuildRequest, EntityKind, EntityLayout, FeedBuildError, FeedLayout, FeedLayoutError,
    FeedSchemaError, SCHEMA_VERSION, build_feed_database, initialise_schema, load_feed,
    open_database, reset_database,
};
