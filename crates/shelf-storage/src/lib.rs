//! shelf-storage - Storage library for shelftalk
//!
//! This crate provides the SQLite implementation of the discussion store,
//! member directory and book catalog.

mod sqlite_store;

pub use sqlite_store::{default_database_path, SqliteStore, CURRENT_SCHEMA_VERSION};
