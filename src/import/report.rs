//! Per-call result reporting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One rejected row. `row` is the 1-based position in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.row, self.message)
    }
}

/// Outcome of one import call.
///
/// `success` is true only when no row was rejected. A call can report
/// `success = false` with non-zero counts: those creates and updates are
/// committed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub success: bool,
    pub created_count: usize,
    pub updated_count: usize,
    pub errors: Vec<RowError>,
}

/// Accumulates row errors and commit counts during a call.
#[derive(Debug, Default)]
pub struct ImportReport {
    errors: Vec<RowError>,
    created: usize,
    updated: usize,
}

impl ImportReport {
    /// Record a rejected row.
    pub fn reject(&mut self, row: usize, reason: &impl fmt::Display) {
        self.errors.push(RowError {
            row,
            message: reason.to_string(),
        });
    }

    /// Record the counts of a committed (or, in a dry run, would-be) batch.
    pub const fn record_commit(&mut self, created: usize, updated: usize) {
        self.created = created;
        self.updated = updated;
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn finish(self) -> ImportResult {
        ImportResult {
            success: self.errors.is_empty(),
            created_count: self.created,
            updated_count: self.updated,
            errors: self.errors,
        }
    }
}
