//! Test-only, in-memory `RecordStore` used by unit and behaviour tests.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use thiserror::Error;

use crate::{FailureScope, InsertStatement, PreparedInsert, RecordStore};

/// Errors raised by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryStoreError {
    /// The insert names a table that was never declared.
    #[error("no such table: {table}")]
    MissingTable {
        /// Requested table.
        table: String,
    },
    /// The insert names a column the table does not have.
    #[error("table {table} has no column named {column}")]
    MissingColumn {
        /// Requested table.
        table: String,
        /// Unknown column.
        column: String,
    },
    /// A row carried the value the store was told to reject.
    #[error("value {value} rejected by constraint")]
    Rejected {
        /// Offending value.
        value: String,
    },
    /// A row carried the value the store was told to fail on.
    #[error("connection lost while writing {value}")]
    Severed {
        /// Value that triggered the failure.
        value: String,
    },
    /// `begin` was called inside an open transaction.
    #[error("cannot start a transaction within a transaction")]
    NestedTransaction,
    /// `commit` or `rollback` was called without an open transaction.
    #[error("no transaction is active")]
    NoTransaction,
}

#[derive(Debug, Default)]
struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// In-memory `RecordStore` implementation used in tests.
///
/// Rows written inside a transaction are staged until `commit`; `rollback`
/// discards them. Unlisted columns of a table are stored as empty strings.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RefCell<BTreeMap<String, Table>>,
    staged: RefCell<Vec<(String, Vec<String>)>>,
    in_transaction: bool,
    rejecting: Option<String>,
    severing_on: Option<String>,
    prepares: Cell<usize>,
    batches: Vec<String>,
}

impl MemoryStore {
    /// Declare a table with the given columns.
    #[must_use]
    pub fn with_table<I, C>(self, name: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.tables.borrow_mut().insert(
            name.to_owned(),
            Table {
                columns: columns.into_iter().map(Into::into).collect(),
                rows: Vec::new(),
            },
        );
        self
    }

    /// Reject any row containing `value` as a row-scoped failure.
    #[must_use]
    pub fn rejecting(mut self, value: &str) -> Self {
        self.rejecting = Some(value.to_owned());
        self
    }

    /// Fail with a connection-scoped error on any row containing `value`.
    #[must_use]
    pub fn severing_on(mut self, value: &str) -> Self {
        self.severing_on = Some(value.to_owned());
        self
    }

    /// Committed rows of `table` in insertion order.
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Vec<String>> {
        self.tables
            .borrow()
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// Committed values of one column.
    #[must_use]
    pub fn column_values(&self, table: &str, column: &str) -> Vec<String> {
        let tables = self.tables.borrow();
        let Some(t) = tables.get(table) else {
            return Vec::new();
        };
        let Some(index) = t.columns.iter().position(|c| c == column) else {
            return Vec::new();
        };
        t.rows
            .iter()
            .filter_map(|row| row.get(index).cloned())
            .collect()
    }

    /// Number of inserts prepared so far.
    #[must_use]
    pub fn prepare_count(&self) -> usize {
        self.prepares.get()
    }

    /// Whether a transaction is open.
    #[must_use]
    pub const fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Statements passed to `execute_batch`, in order.
    #[must_use]
    pub fn batches(&self) -> &[String] {
        &self.batches
    }
}

impl RecordStore for MemoryStore {
    type Error = MemoryStoreError;
    type Insert<'s> = MemoryInsert<'s>;

    fn execute_batch(&mut self, sql: &str) -> Result<(), Self::Error> {
        self.batches.push(sql.to_owned());
        Ok(())
    }

    fn begin(&mut self) -> Result<(), Self::Error> {
        if self.in_transaction {
            return Err(MemoryStoreError::NestedTransaction);
        }
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), Self::Error> {
        if !self.in_transaction {
            return Err(MemoryStoreError::NoTransaction);
        }
        self.in_transaction = false;
        let mut tables = self.tables.borrow_mut();
        for (table, row) in self.staged.take() {
            if let Some(t) = tables.get_mut(&table) {
                t.rows.push(row);
            }
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), Self::Error> {
        if !self.in_transaction {
            return Err(MemoryStoreError::NoTransaction);
        }
        self.in_transaction = false;
        self.staged.borrow_mut().clear();
        Ok(())
    }

    fn prepare_insert(
        &self,
        statement: InsertStatement<'_>,
    ) -> Result<Self::Insert<'_>, Self::Error> {
        let tables = self.tables.borrow();
        let table = tables
            .get(statement.table())
            .ok_or_else(|| MemoryStoreError::MissingTable {
                table: statement.table().to_owned(),
            })?;
        let positions = statement
            .columns()
            .iter()
            .map(|column| {
                table
                    .columns
                    .iter()
                    .position(|c| c == column)
                    .ok_or_else(|| MemoryStoreError::MissingColumn {
                        table: statement.table().to_owned(),
                        column: column.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.prepares.set(self.prepares.get() + 1);
        Ok(MemoryInsert {
            store: self,
            table: statement.table().to_owned(),
            width: table.columns.len(),
            positions,
        })
    }

    fn classify(&self, error: &Self::Error) -> FailureScope {
        match error {
            MemoryStoreError::Severed { .. } => FailureScope::Connection,
            _ => FailureScope::Row,
        }
    }
}

/// Insert prepared by [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryInsert<'s> {
    store: &'s MemoryStore,
    table: String,
    width: usize,
    positions: Vec<usize>,
}

impl PreparedInsert for MemoryInsert<'_> {
    type Error = MemoryStoreError;

    fn insert_row(&mut self, values: &[String]) -> Result<(), Self::Error> {
        let matches = |needle: &Option<String>| {
            needle
                .as_ref()
                .and_then(|n| values.iter().find(|v| *v == n))
                .cloned()
        };
        if let Some(value) = matches(&self.store.severing_on) {
            return Err(MemoryStoreError::Severed { value });
        }
        if let Some(value) = matches(&self.store.rejecting) {
            return Err(MemoryStoreError::Rejected { value });
        }
        let mut row = vec![String::new(); self.width];
        for (&position, value) in self.positions.iter().zip(values) {
            if let Some(slot) = row.get_mut(position) {
                slot.clone_from(value);
            }
        }
        self.store
            .staged
            .borrow_mut()
            .push((self.table.clone(), row));
        Ok(())
    }
}
