#![allow(dead_code)]

use roster_import::storage::{Gateway, Record, SqliteStorage};
use std::sync::Once;
use std::time::Instant;
use tempfile::TempDir;
use tracing::info;

pub mod cli;
pub mod fixtures;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        roster_import::logging::init_test_logging();
    });
}

pub struct TestLogGuard {
    name: String,
    start: Instant,
}

impl TestLogGuard {
    fn new(name: &str) -> Self {
        init_test_logging();
        info!("{name}: starting");
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }
}

impl Drop for TestLogGuard {
    fn drop(&mut self) {
        info!(
            "{}: assertions passed (elapsed {:?})",
            self.name,
            self.start.elapsed()
        );
    }
}

pub fn test_log(name: &str) -> TestLogGuard {
    TestLogGuard::new(name)
}

pub fn test_db() -> SqliteStorage {
    init_test_logging();
    SqliteStorage::open_memory().expect("Failed to create test database")
}

pub fn test_db_with_dir() -> (SqliteStorage, TempDir) {
    init_test_logging();
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join(".roster").join("roster.db");
    std::fs::create_dir_all(db_path.parent().unwrap()).unwrap();
    let storage = SqliteStorage::open(&db_path).expect("Failed to create test database");
    (storage, dir)
}

/// Gateway wrapper whose Nth `save_changes` call fails (1-based).
///
/// The failing save discards its pending writes, like a rolled-back
/// transaction.
pub struct FailingGateway {
    pub inner: SqliteStorage,
    fail_on_save: usize,
    saves: usize,
}

impl FailingGateway {
    pub fn new(inner: SqliteStorage, fail_on_save: usize) -> Self {
        Self {
            inner,
            fail_on_save,
            saves: 0,
        }
    }

    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl Gateway for FailingGateway {
    fn load_all<R: Record>(&self) -> roster_import::Result<Vec<R>> {
        self.inner.load_all()
    }

    fn add_range<R: Record>(&mut self, records: &[R]) {
        self.inner.add_range(records);
    }

    fn update_range<R: Record>(&mut self, records: &[R]) {
        self.inner.update_range(records);
    }

    fn save_changes(&mut self) -> roster_import::Result<usize> {
        self.saves += 1;
        if self.saves == self.fail_on_save {
            self.inner.discard_changes();
            return Err(anyhow::anyhow!("injected save failure").into());
        }
        self.inner.save_changes()
    }

    fn discard_changes(&mut self) {
        self.inner.discard_changes();
    }

    fn pending_changes(&self) -> usize {
        self.inner.pending_changes()
    }
}
