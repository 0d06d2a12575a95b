//! Context helpers for `Result` values.

use super::{ImportPhase, RosterError};

/// Extension methods for attaching context to fallible results.
pub trait ResultExt<T> {
    /// Wrap the error with a static context message.
    ///
    /// # Errors
    ///
    /// Returns the original error wrapped in `RosterError::WithContext`.
    fn context(self, context: impl Into<String>) -> Result<T, RosterError>;

    /// Wrap the error with a lazily built context message.
    ///
    /// # Errors
    ///
    /// Returns the original error wrapped in `RosterError::WithContext`.
    fn with_context<F, S>(self, f: F) -> Result<T, RosterError>
    where
        F: FnOnce() -> S,
        S: Into<String>;

    /// Tag the error as the batch-fatal failure of an import phase.
    ///
    /// # Errors
    ///
    /// Returns the original error wrapped in `RosterError::Phase`.
    fn in_phase(self, phase: ImportPhase) -> Result<T, RosterError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<RosterError>,
{
    fn context(self, context: impl Into<String>) -> Result<T, RosterError> {
        self.map_err(|err| RosterError::WithContext {
            context: context.into(),
            source: Box::new(err.into()),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T, RosterError>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|err| RosterError::WithContext {
            context: f().into(),
            source: Box::new(err.into()),
        })
    }

    fn in_phase(self, phase: ImportPhase) -> Result<T, RosterError> {
        self.map_err(|err| err.into().in_phase(phase))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_wraps_message() {
        let res: Result<(), std::io::Error> = Err(std::io::Error::other("disk gone"));
        let err = res.context("Failed to read rows").unwrap_err();
        assert_eq!(err.to_string(), "Failed to read rows: I/O error: disk gone");
    }

    #[test]
    fn test_in_phase_tags_error() {
        let res: Result<(), RosterError> = Err(RosterError::Config("bad".into()));
        let err = res.in_phase(ImportPhase::AssociationCommit).unwrap_err();
        assert_eq!(err.phase(), Some(ImportPhase::AssociationCommit));
    }
}
