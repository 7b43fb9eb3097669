//! Core parsing and bulk-loading for transit feed files.
//!
//! A feed is a directory of comma-separated text files, one per entity. Each
//! file is described by a [`LoadJob`] naming its destination table and column
//! order. [`load`] streams a file through [`parse_line`] into any
//! [`RecordStore`] inside a single transaction, tolerating malformed rows and
//! reporting them as [`RowWarning`]s. [`load_all`] runs a list of jobs and
//! aggregates the outcome into a [`LoadReport`].

#![forbid(unsafe_code)]

mod job;
mod loader;
mod record;
mod report;
mod store;

#[cfg(test)]
mod test_support;

pub use job::{InsertStatement, LoadJob, LoadJobError};
pub use loader::{FailurePolicy, LoadError, StoreFailure, load, load_all};
pub use record::{DEFAULT_DELIMITER, Record, parse_line};
pub use report::{JobOutcome, LoadReport, LoadResult, LoadStatus, RowWarning, WarningKind};
pub use store::{FailureScope, PreparedInsert, RecordStore};
