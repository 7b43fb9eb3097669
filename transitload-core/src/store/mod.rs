//! The relational store boundary used by the loader.
//!
//! The loader needs three things from a store: run one-shot statements,
//! prepare a positional insert that can be executed repeatedly with text
//! parameters, and begin/commit/roll back a transaction. Nested transactions
//! and savepoints are never requested.

use std::error::Error as StdError;

use crate::InsertStatement;

#[cfg(feature = "store-sqlite")]
mod sqlite;

/// How far a failed insert reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureScope {
    /// Only the offending row is affected; the job carries on.
    Row,
    /// The store itself is unusable; the job must stop.
    Connection,
}

/// A relational store that accepts batched text inserts.
///
/// # Examples
///
/// ```
/// use std::convert::Infallible;
/// use transitload_core::{InsertStatement, PreparedInsert, RecordStore};
///
/// #[derive(Default)]
/// struct CountingStore {
///     rows: std::cell::Cell<usize>,
/// }
///
/// struct CountingInsert<'s>(&'s CountingStore);
///
/// impl PreparedInsert for CountingInsert<'_> {
///     type Error = Infallible;
///
///     fn insert_row(&mut self, _values: &[String]) -> Result<(), Self::Error> {
///         self.0.rows.set(self.0.rows.get() + 1);
///         Ok(())
///     }
/// }
///
/// impl RecordStore for CountingStore {
///     type Error = Infallible;
///     type Insert<'s> = CountingInsert<'s>;
///
///     fn execute_batch(&mut self, _sql: &str) -> Result<(), Self::Error> {
///         Ok(())
///     }
///
///     fn begin(&mut self) -> Result<(), Self::Error> {
///         Ok(())
///     }
///
///     fn commit(&mut self) -> Result<(), Self::Error> {
///         Ok(())
///     }
///
///     fn rollback(&mut self) -> Result<(), Self::Error> {
///         Ok(())
///     }
///
///     fn prepare_insert(
///         &self,
///         _statement: InsertStatement<'_>,
///     ) -> Result<Self::Insert<'_>, Self::Error> {
///         Ok(CountingInsert(self))
///     }
/// }
///
/// let store = CountingStore::default();
/// let mut insert = CountingInsert(&store);
/// insert.insert_row(&["1".to_owned()]).unwrap_or_else(|never| match never {});
/// assert_eq!(store.rows.get(), 1);
/// ```
pub trait RecordStore {
    /// Error reported by every store operation.
    type Error: StdError + Send + Sync + 'static;

    /// Prepared insert borrowed from the store.
    type Insert<'s>: PreparedInsert<Error = Self::Error>
    where
        Self: 's;

    /// Run one or more statements that take no parameters, such as DDL.
    fn execute_batch(&mut self, sql: &str) -> Result<(), Self::Error>;

    /// Open a transaction.
    fn begin(&mut self) -> Result<(), Self::Error>;

    /// Commit the open transaction.
    fn commit(&mut self) -> Result<(), Self::Error>;

    /// Discard the open transaction.
    fn rollback(&mut self) -> Result<(), Self::Error>;

    /// Prepare `statement` once so it can be executed for many rows.
    ///
    /// Fails when the destination table or a column does not exist.
    fn prepare_insert(
        &self,
        statement: InsertStatement<'_>,
    ) -> Result<Self::Insert<'_>, Self::Error>;

    /// Decide whether a failed insert only concerns its row.
    ///
    /// Stores that cannot tell the difference treat every failure as
    /// row-scoped.
    fn classify(&self, _error: &Self::Error) -> FailureScope {
        FailureScope::Row
    }
}

/// An insert prepared once and executed per row.
pub trait PreparedInsert {
    /// Error reported when a row cannot be written.
    type Error;

    /// Bind `values` positionally as text, execute, and reset the statement
    /// for the next row.
    fn insert_row(&mut self, values: &[String]) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io;

    struct PlainStore;

    struct PlainInsert;

    impl PreparedInsert for PlainInsert {
        type Error = io::Error;

        fn insert_row(&mut self, _values: &[String]) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    impl RecordStore for PlainStore {
        type Error = io::Error;
        type Insert<'s>
            = PlainInsert
        where
            Self: 's;

        fn execute_batch(&mut self, _sql: &str) -> Result<(), Self::Error> {
            Ok(())
        }

        fn begin(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn commit(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn rollback(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn prepare_insert(
            &self,
            _statement: InsertStatement<'_>,
        ) -> Result<Self::Insert<'_>, Self::Error> {
            Ok(PlainInsert)
        }
    }

    #[rstest]
    #[case(io::ErrorKind::InvalidData)]
    #[case(io::ErrorKind::BrokenPipe)]
    fn unclassified_failures_are_row_scoped(#[case] kind: io::ErrorKind) {
        let err = io::Error::new(kind, "insert failed");
        assert_eq!(PlainStore.classify(&err), FailureScope::Row);
    }
}
