//! Load jobs describing one file-to-table transfer.

use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// One source file bound to a destination table and its column order.
///
/// Column order decides positional correspondence: the first field of every
/// record is bound to the first column, and so on. Jobs are immutable once
/// built.
///
/// # Examples
///
/// ```
/// use transitload_core::LoadJob;
///
/// # fn main() -> Result<(), transitload_core::LoadJobError> {
/// let job = LoadJob::new(
///     "feed/calendar_dates.txt",
///     "calendar_date",
///     ["service_id", "date", "exception_type"],
/// )?;
/// assert_eq!(job.column_count(), 3);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadJob {
    source_path: Utf8PathBuf,
    table_name: String,
    column_names: Vec<String>,
}

/// Errors returned by [`LoadJob::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadJobError {
    /// The destination table name was blank.
    #[error("load job for {source_path} has no table name")]
    EmptyTableName {
        /// Source file of the rejected job.
        source_path: Utf8PathBuf,
    },
    /// No destination columns were given.
    #[error("load job for table {table} lists no columns")]
    NoColumns {
        /// Destination table.
        table: String,
    },
    /// A column name was blank.
    #[error("column {position} of table {table} has an empty name")]
    EmptyColumnName {
        /// Destination table.
        table: String,
        /// Zero-based position of the blank column.
        position: usize,
    },
    /// The same column was listed twice.
    #[error("column {column} is listed more than once for table {table}")]
    DuplicateColumn {
        /// Destination table.
        table: String,
        /// Repeated column name.
        column: String,
    },
}

impl LoadJob {
    /// Validate and build a job.
    pub fn new<P, T, I, C>(
        source_path: P,
        table_name: T,
        column_names: I,
    ) -> Result<Self, LoadJobError>
    where
        P: Into<Utf8PathBuf>,
        T: Into<String>,
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let source_path = source_path.into();
        let table_name = table_name.into();
        if table_name.trim().is_empty() {
            return Err(LoadJobError::EmptyTableName { source_path });
        }

        let column_names: Vec<String> = column_names.into_iter().map(Into::into).collect();
        if column_names.is_empty() {
            return Err(LoadJobError::NoColumns { table: table_name });
        }
        let mut seen = HashSet::with_capacity(column_names.len());
        for (position, column) in column_names.iter().enumerate() {
            if column.trim().is_empty() {
                return Err(LoadJobError::EmptyColumnName {
                    table: table_name,
                    position,
                });
            }
            if !seen.insert(column.as_str()) {
                return Err(LoadJobError::DuplicateColumn {
                    table: table_name,
                    column: column.clone(),
                });
            }
        }

        Ok(Self {
            source_path,
            table_name,
            column_names,
        })
    }

    /// File the rows are read from.
    #[must_use]
    pub fn source_path(&self) -> &Utf8Path {
        &self.source_path
    }

    /// Destination table.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Destination columns in field order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Number of fields every row must carry.
    #[must_use]
    pub const fn column_count(&self) -> usize {
        self.column_names.len()
    }

    /// The parameterised insert shared by every row of this job.
    #[must_use]
    pub fn insert_statement(&self) -> InsertStatement<'_> {
        InsertStatement {
            table: &self.table_name,
            columns: &self.column_names,
        }
    }
}

/// Positional insert into one table.
///
/// Stores either render it with [`InsertStatement::to_sql`] or interpret the
/// table and column names directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertStatement<'a> {
    table: &'a str,
    columns: &'a [String],
}

impl<'a> InsertStatement<'a> {
    /// Destination table.
    #[must_use]
    pub const fn table(&self) -> &'a str {
        self.table
    }

    /// Destination columns in parameter order.
    #[must_use]
    pub const fn columns(&self) -> &'a [String] {
        self.columns
    }

    /// Render the statement with quoted identifiers and numbered parameters.
    ///
    /// # Examples
    ///
    /// ```
    /// use transitload_core::LoadJob;
    ///
    /// # fn main() -> Result<(), transitload_core::LoadJobError> {
    /// let job = LoadJob::new("shapes.txt", "shape", ["shape_id", "shape_pt_lat"])?;
    /// assert_eq!(
    ///     job.insert_statement().to_sql(),
    ///     r#"INSERT INTO "shape" ("shape_id", "shape_pt_lat") VALUES (?1, ?2)"#,
    /// );
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn to_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|column| quote_identifier(column))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=self.columns.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({columns}) VALUES ({placeholders})",
            quote_identifier(self.table)
        )
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
