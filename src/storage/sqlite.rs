//! SQLite storage implementation.

use super::{Gateway, Record};
use crate::error::Result;
use crate::storage::schema::apply_schema;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params_from_iter};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// A single staged statement.
#[derive(Debug, Clone)]
struct PendingWrite {
    table: &'static str,
    sql: String,
    values: Vec<Value>,
}

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
    pending: Vec<PendingWrite>,
}

impl SqliteStorage {
    /// Open a new connection to the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema application fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a new connection with an optional busy timeout (ms).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema application fails.
    pub fn open_with_timeout(path: &Path, lock_timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;
        if let Some(timeout) = lock_timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        }
        apply_schema(&conn)?;
        Ok(Self {
            conn,
            pending: Vec::new(),
        })
    }

    /// Open an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self {
            conn,
            pending: Vec::new(),
        })
    }

    /// Count rows of a record table.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count<R: Record>(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", R::TABLE);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Get a config value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM config WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Fetch all config values from the config table.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_all_config(&self) -> Result<HashMap<String, String>> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM config")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut map = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            map.insert(key, value);
        }
        Ok(map)
    }

    /// Set a config value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub fn set_config(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO config (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    fn insert_sql<R: Record>() -> String {
        let placeholders = (1..=R::COLUMNS.len())
            .map(|idx| format!("?{idx}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            R::TABLE,
            R::COLUMNS.join(", ")
        )
    }

    fn update_sql<R: Record>() -> String {
        let assignments = R::COLUMNS
            .iter()
            .enumerate()
            .skip(1)
            .map(|(idx, column)| format!("{column} = ?{}", idx + 1))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "UPDATE {} SET {assignments} WHERE {} = ?1",
            R::TABLE,
            R::COLUMNS[0]
        )
    }

    fn stage<R: Record>(&mut self, sql: &str, records: &[R]) {
        self.pending.extend(records.iter().map(|record| PendingWrite {
            table: R::TABLE,
            sql: sql.to_string(),
            values: record.to_values(),
        }));
    }
}

impl Gateway for SqliteStorage {
    fn load_all<R: Record>(&self) -> Result<Vec<R>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY rowid",
            R::COLUMNS.join(", "),
            R::TABLE
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map([], |row| R::from_row(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn add_range<R: Record>(&mut self, records: &[R]) {
        let sql = Self::insert_sql::<R>();
        self.stage(&sql, records);
    }

    fn update_range<R: Record>(&mut self, records: &[R]) {
        let sql = Self::update_sql::<R>();
        self.stage(&sql, records);
    }

    fn save_changes(&mut self) -> Result<usize> {
        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            return Ok(0);
        }

        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        let mut written = 0;
        for write in &pending {
            let mut stmt = tx.prepare_cached(&write.sql)?;
            let changed = stmt.execute(params_from_iter(write.values.iter()))?;
            tracing::trace!(table = write.table, changed, "Applied staged write");
            written += changed;
        }
        tx.commit()?;

        tracing::debug!(written, "Saved staged changes");
        Ok(written)
    }

    fn discard_changes(&mut self) {
        let dropped = self.pending.len();
        self.pending.clear();
        if dropped > 0 {
            tracing::debug!(dropped, "Discarded staged changes");
        }
    }

    fn pending_changes(&self) -> usize {
        self.pending.len()
    }
}
