//! Structured error output.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Retryability flags
//! - Context for debugging
//!
//! A batch-fatal import failure is reported here as a single top-level
//! error, distinct from the per-row errors carried by `ImportResult`.

use crate::error::{ImportPhase, RosterError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Machine-readable error codes.
///
/// Format: `SCREAMING_SNAKE_CASE` for easy parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Database Errors (exit code 2) ===
    DatabaseNotFound,
    DatabaseError,
    CorruptRow,
    NotInitialized,
    AlreadyInitialized,

    // === Import Errors (exit code 3) ===
    /// Catalog extension aborted the batch
    CatalogExtensionFailed,
    /// Entity or association commit failed
    CommitFailed,
    /// Snapshot could not be loaded
    SnapshotFailed,
    /// Code generator exhausted its attempts
    CodeSpaceExhausted,
    /// Input rows could not be decoded
    RowDecodeError,

    // === Validation Errors (exit code 4) ===
    ValidationFailed,
    InvalidStatus,
    InvalidKind,

    // === Config Errors (exit code 7) ===
    ConfigError,

    // === I/O Errors (exit code 8) ===
    IoError,
    JsonError,
    YamlError,

    // === Internal Errors (exit code 1) ===
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DatabaseNotFound => "DATABASE_NOT_FOUND",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::CorruptRow => "CORRUPT_ROW",
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::CatalogExtensionFailed => "CATALOG_EXTENSION_FAILED",
            Self::CommitFailed => "COMMIT_FAILED",
            Self::SnapshotFailed => "SNAPSHOT_FAILED",
            Self::CodeSpaceExhausted => "CODE_SPACE_EXHAUSTED",
            Self::RowDecodeError => "ROW_DECODE_ERROR",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::InvalidStatus => "INVALID_STATUS",
            Self::InvalidKind => "INVALID_KIND",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether this error is potentially retryable.
    ///
    /// A code-space exhaustion clears once the clock moves on, and a busy
    /// database clears once the other writer commits.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CodeSpaceExhausted
                | Self::DatabaseError
                | Self::ValidationFailed
                | Self::InvalidStatus
                | Self::InvalidKind
                | Self::RowDecodeError
        )
    }

    /// Get the exit code for this error category.
    ///
    /// - 1: Internal/unknown errors
    /// - 2: Database errors
    /// - 3: Import errors
    /// - 4: Validation errors
    /// - 7: Config errors
    /// - 8: I/O errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::DatabaseNotFound
            | Self::DatabaseError
            | Self::CorruptRow
            | Self::NotInitialized
            | Self::AlreadyInitialized => 2,
            Self::CatalogExtensionFailed
            | Self::CommitFailed
            | Self::SnapshotFailed
            | Self::CodeSpaceExhausted
            | Self::RowDecodeError => 3,
            Self::ValidationFailed | Self::InvalidStatus | Self::InvalidKind => 4,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError | Self::YamlError => 8,
            Self::InternalError => 1,
        }
    }

    /// Classify a `RosterError`.
    #[must_use]
    pub fn from_error(err: &RosterError) -> Self {
        StructuredError::extract_code_and_context(err).0
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `RosterError`.
    #[must_use]
    pub fn from_error(err: &RosterError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);
        let hint = err.suggestion().map(str::to_string);

        Self {
            code,
            message: err.to_string(),
            hint,
            retryable: code.is_retryable(),
            context,
        }
    }

    /// Serialize to JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &RosterError) -> (ErrorCode, Option<Value>) {
        match err {
            RosterError::Phase { phase, source } => {
                let (inner, inner_ctx) = Self::extract_code_and_context(source);
                let code = match (phase, inner) {
                    (_, ErrorCode::CodeSpaceExhausted) => ErrorCode::CodeSpaceExhausted,
                    (ImportPhase::Snapshot, ErrorCode::NotInitialized) => {
                        ErrorCode::NotInitialized
                    }
                    (ImportPhase::Snapshot, _) => ErrorCode::SnapshotFailed,
                    (ImportPhase::CatalogExtension, _) => {
                        ErrorCode::CatalogExtensionFailed
                    }
                    (
                        ImportPhase::EntityCommit
                        | ImportPhase::AssociationCommit,
                        _,
                    ) => ErrorCode::CommitFailed,
                };
                (
                    code,
                    Some(json!({
                        "phase": phase.as_str(),
                        "cause_code": inner.as_str(),
                        "cause": inner_ctx,
                    })),
                )
            }
            RosterError::DatabaseNotFound { path } => (
                ErrorCode::DatabaseNotFound,
                Some(json!({"path": path.display().to_string()})),
            ),
            RosterError::Database(_) => (ErrorCode::DatabaseError, None),
            RosterError::CorruptRow { table, reason } => (
                ErrorCode::CorruptRow,
                Some(json!({"table": table, "reason": reason})),
            ),
            RosterError::NotInitialized => (ErrorCode::NotInitialized, None),
            RosterError::AlreadyInitialized { path } => (
                ErrorCode::AlreadyInitialized,
                Some(json!({"path": path.display().to_string()})),
            ),
            RosterError::CodeSpaceExhausted { kind, attempts } => (
                ErrorCode::CodeSpaceExhausted,
                Some(json!({"kind": kind, "attempts": attempts})),
            ),
            RosterError::RowDecode { record, reason } => (
                ErrorCode::RowDecodeError,
                Some(json!({"record": record, "reason": reason})),
            ),
            RosterError::Validation { field, reason } => (
                ErrorCode::ValidationFailed,
                Some(json!({"field": field, "reason": reason})),
            ),
            RosterError::InvalidStatus { status } => {
                (ErrorCode::InvalidStatus, Some(json!({"provided": status})))
            }
            RosterError::InvalidKind { kind } => {
                (ErrorCode::InvalidKind, Some(json!({"provided": kind})))
            }
            RosterError::Config(_) => (ErrorCode::ConfigError, None),
            RosterError::Io(_) => (ErrorCode::IoError, None),
            RosterError::Json(_) => (ErrorCode::JsonError, None),
            RosterError::Yaml(_) => (ErrorCode::YamlError, None),
            RosterError::WithContext { context, source } => {
                let code = source
                    .downcast_ref::<RosterError>()
                    .map_or(ErrorCode::InternalError, |inner| {
                        Self::extract_code_and_context(inner).0
                    });
                (code, Some(json!({"context": context})))
            }
            RosterError::Other(_) => (ErrorCode::InternalError, None),
        }
    }
}
