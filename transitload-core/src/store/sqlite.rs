//! `RecordStore` for SQLite connections.
#![forbid(unsafe_code)]

use rusqlite::{Connection, Error as SqliteError, ErrorCode, Statement, params_from_iter};

use super::{FailureScope, PreparedInsert, RecordStore};
use crate::InsertStatement;

impl RecordStore for Connection {
    type Error = SqliteError;
    type Insert<'s>
        = Statement<'s>
    where
        Self: 's;

    fn execute_batch(&mut self, sql: &str) -> Result<(), Self::Error> {
        Connection::execute_batch(self, sql)
    }

    fn begin(&mut self) -> Result<(), Self::Error> {
        Connection::execute_batch(self, "BEGIN")
    }

    fn commit(&mut self) -> Result<(), Self::Error> {
        Connection::execute_batch(self, "COMMIT")
    }

    fn rollback(&mut self) -> Result<(), Self::Error> {
        Connection::execute_batch(self, "ROLLBACK")
    }

    fn prepare_insert(
        &self,
        statement: InsertStatement<'_>,
    ) -> Result<Self::Insert<'_>, Self::Error> {
        Connection::prepare(self, &statement.to_sql())
    }

    fn classify(&self, error: &Self::Error) -> FailureScope {
        let SqliteError::SqliteFailure(failure, _) = error else {
            return FailureScope::Row;
        };
        // Anything not listed here can stem from the row's own values, for
        // example a trigger or function failing on one field.
        match failure.code {
            ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::SystemIoFailure
            | ErrorCode::DiskFull
            | ErrorCode::ReadOnly
            | ErrorCode::DatabaseCorrupt
            | ErrorCode::NotADatabase
            | ErrorCode::CannotOpen
            | ErrorCode::OutOfMemory
            | ErrorCode::OperationInterrupted
            | ErrorCode::PermissionDenied => FailureScope::Connection,
            _ => FailureScope::Row,
        }
    }
}

impl PreparedInsert for Statement<'_> {
    type Error = SqliteError;

    fn insert_row(&mut self, values: &[String]) -> Result<(), Self::Error> {
        // `execute` binds every parameter and resets the statement afterwards.
        self.execute(params_from_iter(values.iter())).map(|_| ())
    }
}
