//! Unique code generation for reference kinds that require a code.
//!
//! A candidate is `<prefix>-<yyMMddHHmmss><3 random digits>`. On collision
//! with a known code, `-1`, `-2`, ... is appended to the base candidate.
//! The number of attempts is bounded; running out is a systemic failure.

use crate::error::{Result, RosterError};
use crate::model::ReferenceKind;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::HashSet;

pub const DEFAULT_MAX_CODE_ATTEMPTS: u32 = 100;

/// Mints codes that are unique against everything it has seen.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    max_attempts: u32,
    known: HashSet<String>,
}

impl CodeGenerator {
    /// Create a generator seeded with the codes already in use.
    pub fn new<I, S>(max_attempts: u32, known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            max_attempts: max_attempts.max(1),
            known: known.into_iter().map(Into::into).collect(),
        }
    }

    /// Mint a code for `kind` using the wall-clock random suffix.
    ///
    /// # Errors
    ///
    /// Returns `RosterError::CodeSpaceExhausted` if every attempt collides.
    pub fn generate(
        &mut self,
        kind: ReferenceKind,
        prefix: &str,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let random = rand::rng().random_range(0..1000);
        self.generate_with(kind, prefix, now, random)
    }

    /// Mint a code with an explicit random component.
    ///
    /// # Errors
    ///
    /// Returns `RosterError::CodeSpaceExhausted` if every attempt collides.
    pub fn generate_with(
        &mut self,
        kind: ReferenceKind,
        prefix: &str,
        now: DateTime<Utc>,
        random: u16,
    ) -> Result<String> {
        let base = format!("{prefix}-{}{:03}", now.format("%y%m%d%H%M%S"), random % 1000);

        for attempt in 0..self.max_attempts {
            let candidate = if attempt == 0 {
                base.clone()
            } else {
                format!("{base}-{attempt}")
            };
            if self.known.insert(candidate.clone()) {
                if attempt > 0 {
                    tracing::debug!(%kind, attempt, code = %candidate, "Code collided; suffixed");
                }
                return Ok(candidate);
            }
        }

        Err(RosterError::CodeSpaceExhausted {
            kind: kind.label(),
            attempts: self.max_attempts,
        })
    }

    /// True if `code` is already taken.
    #[must_use]
    pub fn is_known(&self, code: &str) -> bool {
        self.known.contains(code)
    }
}
