//! Persistence layer.
//!
//! The importer talks to storage only through [`Gateway`]: whole-table
//! snapshot reads plus a staged unit of work (`add_range` / `update_range`
//! followed by one `save_changes`). [`SqliteStorage`] is the bundled
//! implementation.

mod records;
pub mod schema;
mod sqlite;

pub use sqlite::SqliteStorage;

use crate::error::Result;
use rusqlite::types::Value;

/// A type that maps to exactly one table row.
pub trait Record: Sized {
    /// Table name.
    const TABLE: &'static str;
    /// Column names in `to_values` order. The first column is the primary key.
    const COLUMNS: &'static [&'static str];

    /// Primary key value.
    fn id(&self) -> &str;

    /// Column values in `COLUMNS` order.
    fn to_values(&self) -> Vec<Value>;

    /// Map a row selected with `COLUMNS` back into a record.
    ///
    /// # Errors
    ///
    /// Returns an error if a column is missing or holds an unparseable value.
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self>;
}

/// Generic persistence gateway used by the import pipeline.
///
/// Writes are staged and only reach the store on [`Gateway::save_changes`],
/// which applies everything staged so far as a single atomic unit.
pub trait Gateway {
    /// Load every record of a table, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be mapped.
    fn load_all<R: Record>(&self) -> Result<Vec<R>>;

    /// Stage inserts.
    fn add_range<R: Record>(&mut self, records: &[R]);

    /// Stage full-row updates keyed by primary key.
    fn update_range<R: Record>(&mut self, records: &[R]);

    /// Apply all staged writes atomically. Staged writes are cleared
    /// whether or not the save succeeds.
    ///
    /// Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns an error if any staged write fails; nothing staged is applied.
    fn save_changes(&mut self) -> Result<usize>;

    /// Drop all staged writes without applying them.
    fn discard_changes(&mut self);

    /// Number of staged writes not yet saved.
    fn pending_changes(&self) -> usize;
}
