//! Transactional bulk loading of feed files.

use std::io::{self, BufRead, BufReader};

use camino::Utf8PathBuf;
use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    DEFAULT_DELIMITER, FailureScope, JobOutcome, LoadJob, LoadReport, LoadResult, PreparedInsert,
    RecordStore, RowWarning, parse_line,
};

/// Boxed store error kept as the source of a [`LoadError`].
pub type StoreFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fatal errors that stop a single job.
///
/// The open transaction is rolled back before any of these is returned, so a
/// failed job leaves no rows behind.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source file could not be opened.
    #[error("failed to open source file {path}: {source}")]
    Open {
        /// Path of the source file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Reading the source file failed part way through.
    #[error("failed to read line {line_number} of {path}: {source}")]
    Read {
        /// Path of the source file.
        path: Utf8PathBuf,
        /// Line that could not be read.
        line_number: u64,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The store refused to open a transaction.
    #[error("failed to begin transaction for table {table}: {source}")]
    Begin {
        /// Destination table.
        table: String,
        /// Error reported by the store.
        #[source]
        source: StoreFailure,
    },
    /// The insert could not be prepared, usually because the table or a
    /// column is missing.
    #[error("failed to prepare insert into table {table}: {source}")]
    Prepare {
        /// Destination table.
        table: String,
        /// Error reported by the store.
        #[source]
        source: StoreFailure,
    },
    /// The store failed in a way that affects more than the current row.
    #[error("store failed while inserting line {line_number} into table {table}: {source}")]
    Insert {
        /// Destination table.
        table: String,
        /// Line being inserted when the store failed.
        line_number: u64,
        /// Error reported by the store.
        #[source]
        source: StoreFailure,
    },
    /// The transaction could not be committed.
    #[error("failed to commit transaction for table {table}: {source}")]
    Commit {
        /// Destination table.
        table: String,
        /// Error reported by the store.
        #[source]
        source: StoreFailure,
    },
}

/// What [`load_all`] does after a job fails fatally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Run the remaining jobs anyway.
    #[default]
    Continue,
    /// Stop and leave the remaining jobs unattempted.
    Abort,
}

/// Load one file into its table inside a single transaction.
///
/// The first line is a header and is discarded. Blank lines are ignored.
/// Lines whose field count differs from the job's column count, and lines the
/// store rejects, become [`RowWarning`]s; the transaction is committed with
/// whatever rows were accepted.
///
/// # Errors
///
/// Returns [`LoadError`] when the file cannot be opened or read, or when the
/// store fails outside the scope of a single row. The transaction is rolled
/// back in that case.
///
/// # Examples
///
/// ```
/// use rusqlite::Connection;
/// use transitload_core::{LoadJob, load};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("agency.txt");
/// std::fs::write(&path, "agency_id,agency_name\n1,NJ TRANSIT BUS\n")?;
///
/// let mut connection = Connection::open_in_memory()?;
/// connection.execute_batch("CREATE TABLE agency (agency_id INTEGER, agency_name TEXT)")?;
///
/// let source = path.to_str().ok_or("non UTF-8 temp path")?;
/// let job = LoadJob::new(source, "agency", ["agency_id", "agency_name"])?;
/// let result = load(&job, &mut connection)?;
/// assert_eq!(result.rows_attempted(), 1);
/// assert_eq!(result.rows_failed(), 0);
/// # Ok(())
/// # }
/// ```
pub fn load<S: RecordStore>(job: &LoadJob, store: &mut S) -> Result<LoadResult, LoadError> {
    debug!(
        "loading {} into {} ({} columns)",
        job.source_path(),
        job.table_name(),
        job.column_count()
    );
    let file = transitload_fs::open_utf8_file(job.source_path()).map_err(|source| {
        LoadError::Open {
            path: job.source_path().to_path_buf(),
            source,
        }
    })?;
    let mut lines = SourceLines::new(BufReader::new(file));

    store.begin().map_err(|source| LoadError::Begin {
        table: job.table_name().to_owned(),
        source: Box::new(source),
    })?;

    match insert_rows(job, &*store, &mut lines) {
        Ok(result) => {
            if let Err(source) = store.commit() {
                roll_back(job, store);
                return Err(LoadError::Commit {
                    table: job.table_name().to_owned(),
                    source: Box::new(source),
                });
            }
            info!(
                "loaded {}: {} rows attempted, {} failed, {} skipped",
                job.table_name(),
                result.rows_attempted(),
                result.rows_failed(),
                result.rows_skipped()
            );
            Ok(result)
        }
        Err(err) => {
            roll_back(job, store);
            Err(err)
        }
    }
}

/// Run `jobs` in order against one store.
///
/// Each job gets its own transaction. Fatal job errors are recorded in the
/// report; `policy` decides whether later jobs still run.
pub fn load_all<S: RecordStore>(
    jobs: &[LoadJob],
    store: &mut S,
    policy: FailurePolicy,
) -> LoadReport {
    let mut report = LoadReport::default();
    let mut remaining = jobs.iter();
    while let Some(job) = remaining.next() {
        let outcome = load(job, store);
        let failed = match &outcome {
            Ok(_) => false,
            Err(err) => {
                warn!("{err}");
                true
            }
        };
        report.push(JobOutcome::new(job.clone(), outcome));
        if failed && policy == FailurePolicy::Abort {
            for skipped in remaining.by_ref() {
                report.defer(skipped.clone());
            }
        }
    }
    report
}

fn insert_rows<S, R>(
    job: &LoadJob,
    store: &S,
    lines: &mut SourceLines<R>,
) -> Result<LoadResult, LoadError>
where
    S: RecordStore,
    R: BufRead,
{
    let read_error = |line_number, source| LoadError::Read {
        path: job.source_path().to_path_buf(),
        line_number,
        source,
    };

    let mut insert = store
        .prepare_insert(job.insert_statement())
        .map_err(|source| LoadError::Prepare {
            table: job.table_name().to_owned(),
            source: Box::new(source),
        })?;
    let mut result = LoadResult::default();

    // The header names the source columns; it is not checked against the job.
    if lines.next_line().map_err(|source| read_error(1, source))?.is_none() {
        return Ok(result);
    }

    loop {
        let line_number = lines.line_number() + 1;
        let Some(raw) = lines
            .next_line()
            .map_err(|source| read_error(line_number, source))?
        else {
            break;
        };
        if raw.is_empty() {
            continue;
        }
        let Ok(text) = std::str::from_utf8(raw) else {
            let warning = RowWarning::invalid_encoding(line_number);
            warn!("{}: {warning}", job.table_name());
            result.record_skip(warning);
            continue;
        };

        let record = parse_line(text, DEFAULT_DELIMITER);
        if record.len() != job.column_count() {
            let warning =
                RowWarning::field_count_mismatch(line_number, job.column_count(), record.len());
            warn!("{}: {warning}", job.table_name());
            result.record_skip(warning);
            continue;
        }

        result.record_attempt();
        if let Err(err) = insert.insert_row(record.fields()) {
            if store.classify(&err) == FailureScope::Connection {
                return Err(LoadError::Insert {
                    table: job.table_name().to_owned(),
                    line_number,
                    source: Box::new(err),
                });
            }
            let warning = RowWarning::rejected(line_number, err.to_string());
            warn!("{}: {warning}", job.table_name());
            result.record_failure(warning);
        }
    }

    Ok(result)
}

fn roll_back<S: RecordStore>(job: &LoadJob, store: &mut S) {
    if let Err(err) = store.rollback() {
        warn!(
            "failed to roll back transaction for {}: {err}",
            job.table_name()
        );
    }
}

/// Line reader that strips terminators and counts lines.
struct SourceLines<R> {
    reader: R,
    buffer: Vec<u8>,
    line_number: u64,
}

impl<R: BufRead> SourceLines<R> {
    const fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            line_number: 0,
        }
    }

    /// Number of lines returned so far.
    const fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Next line without its `\n` or `\r\n` terminator, or `None` at the end
    /// of the input.
    fn next_line(&mut self) -> io::Result<Option<&[u8]>> {
        self.buffer.clear();
        if self.reader.read_until(b'\n', &mut self.buffer)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        if self.buffer.last() == Some(&b'\n') {
            self.buffer.pop();
            if self.buffer.last() == Some(&b'\r') {
                self.buffer.pop();
            }
        }
        Ok(Some(&self.buffer))
    }
}
