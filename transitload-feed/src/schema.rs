#![forbid(unsafe_code)]

use rusqlite::{Connection, Error as SqliteError, OptionalExtension, Transaction};
use thiserror::Error;

/// Version recorded in `feed_schema_version` by [`initialise_schema`].
pub const SCHEMA_VERSION: i64 = 1;

/// Create the feed tables inside an existing SQLite database.
///
/// Every table carries a surrogate `id INTEGER PRIMARY KEY` so rows keep
/// their load order. Tables are created only when missing and the schema
/// version is recorded on first use; a database initialised by a different
/// version is rejected.
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use transitload_feed::initialise_schema;
///
/// let mut conn = Connection::open_in_memory().expect("create in-memory database");
/// initialise_schema(&mut conn).expect("create feed schema");
///
/// let tables: i64 = conn
///     .query_row(
///         "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = 'stop_time'",
///         [],
///         |row| row.get(0),
///     )
///     .expect("inspect schema");
/// assert_eq!(tables, 1);
/// ```
pub fn initialise_schema(connection: &mut Connection) -> Result<(), FeedSchemaError> {
    let transaction = connection
        .transaction()
        .map_err(|source| FeedSchemaError::Migration {
            step: "begin schema transaction",
            source,
        })?;

    create_entity_tables(&transaction)?;
    ensure_schema_version(&transaction)?;

    transaction
        .commit()
        .map_err(|source| FeedSchemaError::Migration {
            step: "commit schema transaction",
            source,
        })?;

    Ok(())
}

fn create_entity_tables(transaction: &Transaction<'_>) -> Result<(), FeedSchemaError> {
    run_migration_step(
        transaction,
        "create agency",
        "CREATE TABLE IF NOT EXISTS agency (
            id INTEGER PRIMARY KEY,
            agency_id INTEGER,
            agency_name TEXT,
            agency_url TEXT,
            agency_timezone TEXT,
            agency_lang TEXT,
            agency_phone TEXT
        )",
    )?;
    // Dates stay text so `20120406` round-trips exactly as written.
    run_migration_step(
        transaction,
        "create calendar_date",
        "CREATE TABLE IF NOT EXISTS calendar_date (
            id INTEGER PRIMARY KEY,
            service_id INTEGER,
            date TEXT,
            exception_type INTEGER
        )",
    )?;
    run_migration_step(
        transaction,
        "create route",
        "CREATE TABLE IF NOT EXISTS route (
            id INTEGER PRIMARY KEY,
            route_id INTEGER,
            agency_id INTEGER,
            route_short_name TEXT,
            route_long_name TEXT,
            route_type INTEGER,
            route_url TEXT,
            route_color TEXT
        )",
    )?;
    run_migration_step(
        transaction,
        "create stop",
        "CREATE TABLE IF NOT EXISTS stop (
            id INTEGER PRIMARY KEY,
            stop_id INTEGER,
            stop_code INTEGER,
            stop_name TEXT,
            stop_desc TEXT,
            stop_lat REAL,
            stop_lon REAL,
            zone_id INTEGER
        )",
    )?;
    run_migration_step(
        transaction,
        "create trip",
        "CREATE TABLE IF NOT EXISTS trip (
            id INTEGER PRIMARY KEY,
            route_id INTEGER,
            service_id INTEGER,
            trip_id INTEGER,
            trip_headsign TEXT,
            direction_id INTEGER,
            block_id TEXT,
            shape_id INTEGER
        )",
    )?;
    run_migration_step(
        transaction,
        "create shape",
        "CREATE TABLE IF NOT EXISTS shape (
            id INTEGER PRIMARY KEY,
            shape_id INTEGER,
            shape_pt_lat REAL,
            shape_pt_lon REAL,
            shape_pt_sequence INTEGER,
            shape_dist_traveled REAL
        )",
    )?;
    run_migration_step(
        transaction,
        "create stop_time",
        "CREATE TABLE IF NOT EXISTS stop_time (
            id INTEGER PRIMARY KEY,
            trip_id INTEGER,
            arrival_time TEXT,
            departure_time TEXT,
            stop_id INTEGER,
            stop_sequence INTEGER,
            pickup_type INTEGER,
            drop_off_type INTEGER,
            shape_dist_traveled REAL
        )",
    )
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), FeedSchemaError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS feed_schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0),
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        ) WITHOUT ROWID",
    )?;

    let existing_version: Option<i64> = transaction
        .query_row("SELECT version FROM feed_schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|source| FeedSchemaError::Migration {
            step: "read schema version",
            source,
        })?;

    match existing_version {
        Some(version) if version == SCHEMA_VERSION => {}
        Some(found) => {
            return Err(FeedSchemaError::VersionMismatch {
                expected: SCHEMA_VERSION,
                found,
            });
        }
        None => {
            transaction
                .execute(
                    "INSERT INTO feed_schema_version (version) VALUES (?1)",
                    [SCHEMA_VERSION],
                )
                .map_err(|source| FeedSchemaError::Migration {
                    step: "record schema version",
                    source,
                })?;
        }
    }

    Ok(())
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), FeedSchemaError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| FeedSchemaError::Migration { step, source })
}

/// Errors raised when initialising the feed schema.
#[derive(Debug, Error)]
pub enum FeedSchemaError {
    /// A schema statement failed.
    #[error("failed to execute migration step '{step}'")]
    Migration {
        /// Step that failed.
        step: &'static str,
        /// Underlying SQLite error.
        #[source]
        source: SqliteError,
    },
    /// The database was initialised by a different schema version.
    #[error(
        "expected feed schema version {expected} but found {found}; recreate the database before retrying"
    )]
    VersionMismatch {
        /// Version this build writes.
        expected: i64,
        /// Version recorded in the database.
        found: i64,
    },
}
