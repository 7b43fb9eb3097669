//! Shared fixtures for feed database tests.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use rusqlite::Connection;

/// Epsilon for floating-point comparisons of loaded REAL columns.
const REAL_EPSILON: f64 = 1.0e-9;

/// Row counts of the sample feed, in default layout order.
pub const SAMPLE_COUNTS: [(&str, i64); 7] = [
    ("agency", 1),
    ("calendar_date", 16),
    ("route", 3),
    ("stop", 4),
    ("trip", 2),
    ("shape", 5),
    ("stop_time", 7),
];

/// Directory containing the sample feed.
pub fn sample_feed_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/feed")
}

/// Copy the sample feed into `target`, leaving out the files named in `skip`.
pub fn copy_sample_feed(target: &Utf8Path, skip: &[&str]) {
    fs::create_dir_all(target).unwrap_or_else(|err| {
        panic!("failed to create feed directory {target}: {err}");
    });
    let source = sample_feed_dir();
    let entries = fs::read_dir(&source).unwrap_or_else(|err| {
        panic!("failed to list sample feed {source}: {err}");
    });
    for item in entries {
        let entry = item.unwrap_or_else(|err| panic!("failed to read feed entry: {err}"));
        let name = entry.file_name().to_string_lossy().into_owned();
        if skip.contains(&name.as_str()) {
            continue;
        }
        fs::copy(entry.path(), target.join(&name)).unwrap_or_else(|err| {
            panic!("failed to copy {name} into {target}: {err}");
        });
    }
}

/// Number of rows in `table`.
pub fn row_count(connection: &Connection, table: &str) -> i64 {
    connection
        .query_row(&format!("SELECT count(*) FROM {table}"), [], |row| row.get(0))
        .unwrap_or_else(|err| panic!("failed to count rows of {table}: {err}"))
}

/// Compare floating-point values within a small epsilon.
#[expect(
    clippy::float_arithmetic,
    reason = "test delta computation requires float maths"
)]
pub fn assert_close(actual: f64, expected: f64) {
    let delta = (actual - expected).abs();
    assert!(
        delta <= REAL_EPSILON,
        "expected {expected}, got {actual} (|Δ| = {delta})"
    );
}
