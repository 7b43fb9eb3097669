//! Test helpers for writing small feeds and layouts to scratch directories.

use super::*;
use crate::load::{LoadConfig, execute_load};
use camino::{Utf8Path, Utf8PathBuf};
use rusqlite::Connection;
use std::fs;
use tempfile::TempDir;
use transitload_core::FailurePolicy;

const AGENCY: &str = "agency_id,agency_name\n\
                      1,\"NJ TRANSIT BUS\"\n\
                      2,\"NJ TRANSIT RAIL\"\n";
const ROUTES: &str = "route_id,agency_id,route_short_name\n\
                      1,1,\"1\"\n\
                      6,1,\"10\"\n\
                      7,1,\"11\"\n";
const LAYOUT: &str = r#"{
  "entities": [
    { "kind": "agency", "file_name": "agency.txt", "columns": ["agency_id", "agency_name"] },
    { "kind": "route", "file_name": "routes.txt", "columns": ["route_id", "agency_id", "route_short_name"] }
  ]
}"#;

/// Scratch directory holding a two-file feed, its layout, and a database path.
#[derive(Debug)]
pub(super) struct FeedWorkspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl FeedWorkspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        fs::create_dir_all(root.join("feed")).expect("create feed directory");
        let workspace = Self { _dir: dir, root };
        workspace.write_feed_file("agency.txt", AGENCY);
        workspace.write_feed_file("routes.txt", ROUTES);
        fs::write(workspace.layout(), LAYOUT).expect("write layout");
        workspace
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn feed_dir(&self) -> Utf8PathBuf {
        self.root.join("feed")
    }

    pub(super) fn database(&self) -> Utf8PathBuf {
        self.root.join("out/feed.db")
    }

    pub(super) fn layout(&self) -> Utf8PathBuf {
        self.root.join("layout.json")
    }

    pub(super) fn write_feed_file(&self, name: &str, contents: &str) {
        fs::write(self.feed_dir().join(name), contents)
            .unwrap_or_else(|err| panic!("failed to write {name}: {err}"));
    }

    pub(super) fn remove_feed_file(&self, name: &str) {
        fs::remove_file(self.feed_dir().join(name))
            .unwrap_or_else(|err| panic!("failed to remove {name}: {err}"));
    }

    /// Configuration loading the workspace feed with its layout.
    pub(super) fn config(&self) -> LoadConfig {
        LoadConfig {
            feed_dir: self.feed_dir(),
            database: self.database(),
            layout: Some(self.layout()),
            replace_existing: true,
            policy: FailurePolicy::Continue,
        }
    }

    pub(super) fn row_count(&self, table: &str) -> i64 {
        let connection = Connection::open(self.database().as_std_path()).expect("open database");
        connection
            .query_row(&format!("SELECT count(*) FROM {table}"), [], |row| row.get(0))
            .unwrap_or_else(|err| panic!("failed to count rows of {table}: {err}"))
    }
}

/// Run `config` and return the result alongside everything written.
pub(super) fn execute_capturing(config: &LoadConfig) -> (Result<(), CliError>, String) {
    let mut output = Vec::new();
    let result = execute_load(config, &mut output);
    let text = String::from_utf8(output).expect("summary is UTF-8");
    (result, text)
}
