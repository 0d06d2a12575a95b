//! Database schema definitions and migration logic.
//!
//! Every uniqueness rule the importer relies on is backed by an index here,
//! so a concurrent writer that slips past the in-memory snapshot still fails
//! at commit time instead of producing a duplicate.

use rusqlite::{Connection, OptionalExtension, Result};

pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the roster database.
pub const SCHEMA_SQL: &str = r"
    -- Reference catalog
    CREATE TABLE IF NOT EXISTS reference_entries (
        id TEXT PRIMARY KEY,
        kind TEXT NOT NULL,
        code TEXT,
        name TEXT NOT NULL,
        normalized_name TEXT NOT NULL,
        parent_id TEXT REFERENCES reference_entries(id),
        description TEXT,
        status TEXT NOT NULL DEFAULT 'active',
        created_at TEXT NOT NULL,
        created_by TEXT NOT NULL,
        UNIQUE (kind, normalized_name)
    );
    CREATE UNIQUE INDEX IF NOT EXISTS idx_reference_entries_code
        ON reference_entries(kind, code) WHERE code IS NOT NULL;
    CREATE INDEX IF NOT EXISTS idx_reference_entries_parent
        ON reference_entries(parent_id);

    -- Employees
    CREATE TABLE IF NOT EXISTS employees (
        id TEXT PRIMARY KEY,
        employee_code TEXT NOT NULL UNIQUE,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT,
        phone TEXT,
        hire_date TEXT,
        status TEXT NOT NULL DEFAULT 'active',
        department_id TEXT REFERENCES reference_entries(id),
        sub_department_id TEXT REFERENCES reference_entries(id),
        company_id TEXT REFERENCES reference_entries(id),
        project_id TEXT REFERENCES reference_entries(id),
        nationality_id TEXT REFERENCES reference_entries(id),
        category_id TEXT REFERENCES reference_entries(id),
        position_id TEXT REFERENCES reference_entries(id),
        cost_center_id TEXT REFERENCES reference_entries(id),
        created_at TEXT NOT NULL,
        created_by TEXT NOT NULL,
        updated_at TEXT,
        updated_by TEXT
    );

    -- SIM cards
    CREATE TABLE IF NOT EXISTS sim_cards (
        id TEXT PRIMARY KEY,
        account_number TEXT NOT NULL,
        service_number TEXT NOT NULL,
        sim_type TEXT,
        provider TEXT,
        plan TEXT,
        serial_number TEXT,
        start_date TEXT,
        project_id TEXT REFERENCES reference_entries(id),
        is_assigned INTEGER NOT NULL DEFAULT 0,
        status TEXT NOT NULL DEFAULT 'available',
        created_at TEXT NOT NULL,
        created_by TEXT NOT NULL,
        updated_at TEXT,
        updated_by TEXT,
        UNIQUE (account_number, service_number)
    );

    -- SIM assignments
    CREATE TABLE IF NOT EXISTS sim_assignments (
        id TEXT PRIMARY KEY,
        sim_card_id TEXT NOT NULL REFERENCES sim_cards(id),
        employee_id TEXT NOT NULL REFERENCES employees(id),
        project_id TEXT REFERENCES reference_entries(id),
        status TEXT NOT NULL DEFAULT 'active',
        assigned_at TEXT NOT NULL,
        returned_at TEXT,
        created_by TEXT NOT NULL
    );
    CREATE UNIQUE INDEX IF NOT EXISTS idx_sim_assignments_active_pair
        ON sim_assignments(sim_card_id, employee_id) WHERE status = 'active';
    CREATE INDEX IF NOT EXISTS idx_sim_assignments_employee
        ON sim_assignments(employee_id);

    -- Config (runtime key/value settings)
    CREATE TABLE IF NOT EXISTS config (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    -- Metadata
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

/// Apply the schema to the database.
///
/// This uses `execute_batch` to run the entire DDL script.
/// It is idempotent because all statements use `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    run_migrations(conn)?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    Ok(())
}

/// Stamp or upgrade the recorded schema version.
fn run_migrations(conn: &Connection) -> Result<()> {
    let recorded: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    let version = recorded
        .and_then(|value| value.parse::<i32>().ok())
        .unwrap_or(0);

    if version < CURRENT_SCHEMA_VERSION {
        conn.execute(
            "INSERT INTO metadata (key, value) VALUES ('schema_version', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [CURRENT_SCHEMA_VERSION.to_string()],
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_apply_schema() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).expect("Failed to apply schema");

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        for table in [
            "reference_entries",
            "employees",
            "sim_cards",
            "sim_assignments",
            "config",
            "metadata",
        ] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }

        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        // In-memory DBs use MEMORY journaling, regardless of what we set
        assert!(journal_mode.to_uppercase() == "WAL" || journal_mode.to_uppercase() == "MEMORY");

        let foreign_keys: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(foreign_keys, 1);
    }

    #[test]
    fn test_schema_is_idempotent_and_versioned() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        apply_schema(&conn).unwrap();

        let version: String = conn
            .query_row(
                "SELECT value FROM metadata WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION.to_string());
    }

    #[test]
    fn test_reference_name_unique_per_kind() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        let insert = "INSERT INTO reference_entries
            (id, kind, name, normalized_name, created_at, created_by)
            VALUES (?1, ?2, ?3, ?4, '2025-01-01T00:00:00Z', 'test')";

        conn.execute(insert, ["r1", "company", "Acme", "acme"]).unwrap();
        conn.execute(insert, ["r2", "project", "Acme", "acme"]).unwrap();
        assert!(conn.execute(insert, ["r3", "company", "ACME", "acme"]).is_err());
    }
}
