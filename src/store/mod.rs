//! Persistent key-value storage.
//!
//! The selection layer only needs string-keyed get/set of string values. This
//! module provides that contract as the [`KeyValueStore`] trait and a SQLite
//! implementation that keeps the values in a single `kv` table.

pub mod db;
pub mod error;
pub mod schema;

pub use db::{KeyValueStore, SqliteKvStore};
pub use error::StoreError;
