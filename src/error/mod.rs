//! Error types and handling for `roster_import`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Supports `anyhow` integration for wrapped third-party failures
//! - Batch-fatal failures carry the pipeline phase they happened in
//! - Provides recovery hints and structured JSON output for callers

mod context;
mod structured;

pub use context::ResultExt;
pub use structured::{ErrorCode, StructuredError};

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Stage of an import call. Used to tag batch-fatal errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportPhase {
    /// Loading the reference catalog and entity snapshots.
    Snapshot,
    /// Creating missing reference entries before rows are processed.
    CatalogExtension,
    /// Persisting staged creates and updates of main entities.
    EntityCommit,
    /// Persisting staged association records.
    AssociationCommit,
}

impl ImportPhase {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Snapshot => "snapshot",
            Self::CatalogExtension => "catalog extension",
            Self::EntityCommit => "entity commit",
            Self::AssociationCommit => "association commit",
        }
    }
}

impl fmt::Display for ImportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary error type for `roster_import` operations.
#[derive(Error, Debug)]
pub enum RosterError {
    // === Storage Errors ===
    /// Database file not found at the specified path.
    #[error("Database not found at '{path}'")]
    DatabaseNotFound { path: PathBuf },

    /// `SQLite` database error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored value could not be mapped back into a record.
    #[error("Corrupt {table} row: {reason}")]
    CorruptRow { table: &'static str, reason: String },

    // === Import Errors ===
    /// A batch-fatal failure, tagged with the phase it aborted.
    #[error("Import aborted during {phase}: {source}")]
    Phase {
        phase: ImportPhase,
        #[source]
        source: Box<RosterError>,
    },

    /// The code generator ran out of attempts. Systemic, never per-row.
    #[error("Could not generate a unique {kind} code after {attempts} attempts")]
    CodeSpaceExhausted { kind: &'static str, attempts: u32 },

    /// Input file could not be decoded into rows.
    #[error("Row decode error at record {record}: {reason}")]
    RowDecode { record: usize, reason: String },

    // === Validation Errors ===
    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Invalid status value.
    #[error("Invalid status: {status}")]
    InvalidStatus { status: String },

    /// Unknown reference kind name.
    #[error("Invalid reference kind: {kind}")]
    InvalidKind { kind: String },

    // === Configuration Errors ===
    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workspace not initialized.
    #[error("Roster not initialized: run 'roster init' first")]
    NotInitialized,

    /// Already initialized.
    #[error("Already initialized at '{path}'")]
    AlreadyInitialized { path: PathBuf },

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Wrapped errors ===
    /// Error with additional context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failure from an external `Gateway` or other code outside this crate.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RosterError {
    /// Can the user fix this without code changes?
    #[must_use]
    pub fn is_user_recoverable(&self) -> bool {
        match self {
            Self::DatabaseNotFound { .. }
            | Self::NotInitialized
            | Self::Validation { .. }
            | Self::InvalidStatus { .. }
            | Self::InvalidKind { .. }
            | Self::RowDecode { .. } => true,
            Self::Phase { source, .. } => source.is_user_recoverable(),
            _ => false,
        }
    }

    /// True for failures that indicate a condition outside any single row,
    /// such as exhausting the code space. Sees through phase wrapping.
    #[must_use]
    pub fn is_systemic(&self) -> bool {
        match self {
            Self::CodeSpaceExhausted { .. } => true,
            Self::Phase { source, .. } => source.is_systemic(),
            _ => false,
        }
    }

    /// The phase a batch-fatal error aborted, if any.
    #[must_use]
    pub const fn phase(&self) -> Option<ImportPhase> {
        match self {
            Self::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// The innermost error beneath any phase wrapping.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Phase { source, .. } => source.root(),
            other => other,
        }
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub fn suggestion(&self) -> Option<&'static str> {
        match self.root() {
            Self::NotInitialized => Some("Run: roster init"),
            Self::DatabaseNotFound { .. } => Some("Check path or run: roster init"),
            Self::AlreadyInitialized { .. } => Some("Use --force to reinitialize"),
            Self::CodeSpaceExhausted { .. } => {
                Some("Too many codes minted this second; retry the import")
            }
            Self::InvalidKind { .. } => Some(
                "Valid kinds: department, sub_department, company, project, nationality, category, position, cost_center",
            ),
            Self::RowDecode { .. } => Some("Input must be a JSON array or JSON Lines of row objects"),
            _ => None,
        }
    }

    /// Get the exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        ErrorCode::from_error(self).exit_code()
    }

    /// Create a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Wrap this error as the batch-fatal failure of `phase`.
    ///
    /// An error that already carries a phase keeps its original one.
    #[must_use]
    pub fn in_phase(self, phase: ImportPhase) -> Self {
        match self {
            already @ Self::Phase { .. } => already,
            other => Self::Phase {
                phase,
                source: Box::new(other),
            },
        }
    }
}

/// Result type using `RosterError`.
pub type Result<T> = std::result::Result<T, RosterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RosterError::CodeSpaceExhausted {
            kind: "project",
            attempts: 100,
        };
        assert_eq!(
            err.to_string(),
            "Could not generate a unique project code after 100 attempts"
        );
    }

    #[test]
    fn test_validation_error() {
        let err = RosterError::validation("file", "cannot be empty");
        assert_eq!(err.to_string(), "Validation failed: file: cannot be empty");
    }

    #[test]
    fn test_phase_wrapping_keeps_first_phase() {
        let err = RosterError::Config("boom".to_string())
            .in_phase(ImportPhase::CatalogExtension)
            .in_phase(ImportPhase::EntityCommit);
        assert_eq!(err.phase(), Some(ImportPhase::CatalogExtension));
        assert_eq!(
            err.to_string(),
            "Import aborted during catalog extension: Configuration error: boom"
        );
    }

    #[test]
    fn test_systemic_sees_through_phase() {
        let err = RosterError::CodeSpaceExhausted {
            kind: "cost center",
            attempts: 100,
        }
        .in_phase(ImportPhase::CatalogExtension);
        assert!(err.is_systemic());
        assert!(!RosterError::NotInitialized.is_systemic());
    }

    #[test]
    fn test_user_recoverable() {
        assert!(RosterError::NotInitialized.is_user_recoverable());

        let not_recoverable = RosterError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(1),
            None,
        ));
        assert!(!not_recoverable.is_user_recoverable());
    }

    #[test]
    fn test_suggestion() {
        assert_eq!(
            RosterError::NotInitialized.suggestion(),
            Some("Run: roster init")
        );
        let wrapped = RosterError::NotInitialized.in_phase(ImportPhase::Snapshot);
        assert_eq!(wrapped.suggestion(), Some("Run: roster init"));
    }
}
