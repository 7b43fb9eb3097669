//! Transit feed layout, SQLite schema and database build.
//!
//! The module is split into three focused submodules:
//! - `layout` maps each feed file to its table and column order.
//! - `schema` materialises the SQLite tables the feed is loaded into.
//! - `database` resets, opens and fills a feed database.
#![forbid(unsafe_code)]

mod database;
mod layout;
mod schema;

pub use database::{
    BuildRequest, FeedBuildError, build_feed_database, load_feed, open_database, reset_database,
};
pub use layout::{EntityKind, EntityLayout, FeedLayout, FeedLayoutError};
pub use schema::{FeedSchemaError, SCHEMA_VERSION, initialise_schema};
