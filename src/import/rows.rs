//! Row processing: validate, resolve, and stage one row at a time.
//!
//! A row that fails stages nothing and contributes exactly one row error.
//! Processing continues with the next row.

use crate::error::Result;
use crate::import::context::BatchContext;
use crate::import::extend::CatalogDemand;
use crate::import::report::ImportReport;
use crate::storage::{Gateway, Record};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

/// Why a single row was rejected. The display text is the row error message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowRejection {
    #[error("Duplicate {key_label} '{key}' in import data")]
    DuplicateKey { key_label: &'static str, key: String },

    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("{kind} '{name}' not found")]
    ReferenceNotFound { kind: &'static str, name: String },

    #[error("Invalid {field} '{value}'")]
    InvalidValue { field: &'static str, value: String },
}

/// Fail with `MissingField` for the first blank field, in the order given.
///
/// # Errors
///
/// Returns `RowRejection::MissingField` naming the first blank field.
pub fn require(fields: &[(&'static str, Option<&str>)]) -> std::result::Result<(), RowRejection> {
    for &(field, value) in fields {
        if value.is_none_or(|value| value.trim().is_empty()) {
            return Err(RowRejection::MissingField { field });
        }
    }
    Ok(())
}

/// Parse an optional field with `FromStr`, rejecting unparseable input.
///
/// # Errors
///
/// Returns `RowRejection::InvalidValue` if the non-blank value does not parse.
pub fn parse_optional<T: std::str::FromStr>(
    field: &'static str,
    raw: Option<&str>,
) -> std::result::Result<Option<T>, RowRejection> {
    let Some(value) = crate::import::catalog::non_blank(raw) else {
        return Ok(None);
    };
    value
        .parse::<T>()
        .map(Some)
        .map_err(|_| RowRejection::InvalidValue {
            field,
            value: value.to_string(),
        })
}

/// Trimmed copy of an optional field, `None` when blank.
#[must_use]
pub fn cleaned(raw: Option<&str>) -> Option<String> {
    crate::import::catalog::non_blank(raw).map(str::to_string)
}

/// A decoded input row the pipeline knows how to merge.
pub trait ImportRow {
    /// The main entity this row creates or updates.
    type Entity: Record + Clone;
    /// Natural key identifying the entity across imports.
    type Key: Eq + Hash + Clone + fmt::Display;
    /// Link record a row may stage alongside its entity.
    type Association: Record + Clone;
    /// Extra snapshots this row type consults while staging.
    type Lookups;

    /// Human label of the natural key, used in duplicate errors.
    const KEY_LABEL: &'static str;

    /// The natural key, trimmed; `None` when any key part is blank.
    fn natural_key(&self) -> Option<Self::Key>;

    /// The natural key of an already persisted entity.
    fn entity_key(entity: &Self::Entity) -> Self::Key;

    /// Declare every reference name (and parent pairing) this row uses.
    fn declare_references(&self, demand: &mut CatalogDemand);

    /// Check required scalar fields.
    ///
    /// # Errors
    ///
    /// Returns the first missing field.
    fn check_required(&self) -> std::result::Result<(), RowRejection>;

    /// Load the extra snapshots for this row type.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway cannot load a snapshot.
    fn load_lookups<G: Gateway>(gateway: &G, ctx: &mut BatchContext) -> Result<Self::Lookups>;

    /// Build a new entity from the row.
    ///
    /// # Errors
    ///
    /// Returns a rejection if a reference or value cannot be resolved.
    fn create(&self, ctx: &mut BatchContext) -> std::result::Result<Self::Entity, RowRejection>;

    /// Overwrite the mutable fields of an existing entity from the row.
    ///
    /// # Errors
    ///
    /// Returns a rejection if a reference or value cannot be resolved.
    fn overwrite(
        &self,
        ctx: &BatchContext,
        entity: &mut Self::Entity,
    ) -> std::result::Result<(), RowRejection>;

    /// Stage an association for the row, if it asks for one.
    ///
    /// # Errors
    ///
    /// Returns a rejection if the association target is unusable.
    fn associate(
        &self,
        _ctx: &mut BatchContext,
        _entity: &mut Self::Entity,
        _lookups: &mut Self::Lookups,
    ) -> std::result::Result<Option<Self::Association>, RowRejection> {
        Ok(None)
    }
}

/// Whether a staged entity is new or replaces a persisted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageAction {
    Create,
    Update,
}

/// Everything the row processor staged for commit.
#[derive(Debug, Clone)]
pub struct StagedBatch<E, A> {
    pub creates: Vec<E>,
    pub updates: Vec<E>,
    pub associations: Vec<A>,
}

impl<E, A> Default for StagedBatch<E, A> {
    fn default() -> Self {
        Self {
            creates: Vec::new(),
            updates: Vec::new(),
            associations: Vec::new(),
        }
    }
}

/// Process rows in input order, staging successes and reporting failures.
///
/// Row numbers in the report are 1-based input positions.
pub fn process_rows<R: ImportRow>(
    ctx: &mut BatchContext,
    rows: &[R],
    existing: &HashMap<R::Key, R::Entity>,
    lookups: &mut R::Lookups,
    report: &mut ImportReport,
) -> StagedBatch<R::Entity, R::Association> {
    let mut staged = StagedBatch::default();
    let mut seen = HashSet::new();

    for (idx, row) in rows.iter().enumerate() {
        let row_number = idx + 1;
        match process_row(ctx, row, &mut seen, existing, lookups) {
            Ok((entity, action, association)) => {
                tracing::trace!(row = row_number, ?action, "Row staged");
                match action {
                    StageAction::Create => staged.creates.push(entity),
                    StageAction::Update => staged.updates.push(entity),
                }
                staged.associations.extend(association);
            }
            Err(rejection) => {
                tracing::debug!(row = row_number, reason = %rejection, "Row rejected");
                report.reject(row_number, &rejection);
            }
        }
    }

    staged
}

type Staged<E, A> = (E, StageAction, Option<A>);

fn process_row<R: ImportRow>(
    ctx: &mut BatchContext,
    row: &R,
    seen: &mut HashSet<R::Key>,
    existing: &HashMap<R::Key, R::Entity>,
    lookups: &mut R::Lookups,
) -> std::result::Result<Staged<R::Entity, R::Association>, RowRejection> {
    let key = row.natural_key();
    if let Some(key) = &key {
        // Marked on first sight, even if this row fails further down.
        if !seen.insert(key.clone()) {
            return Err(RowRejection::DuplicateKey {
                key_label: R::KEY_LABEL,
                key: key.to_string(),
            });
        }
    }

    row.check_required()?;
    let key = key.ok_or(RowRejection::MissingField {
        field: R::KEY_LABEL,
    })?;

    let (mut entity, action) = match existing.get(&key) {
        Some(current) => {
            let mut entity = current.clone();
            row.overwrite(ctx, &mut entity)?;
            (entity, StageAction::Update)
        }
        None => (row.create(ctx)?, StageAction::Create),
    };

    let association = row.associate(ctx, &mut entity, lookups)?;
    Ok((entity, action, association))
}

/// Index persisted entities by natural key.
#[must_use]
pub fn index_by_key<R: ImportRow>(entities: Vec<R::Entity>) -> HashMap<R::Key, R::Entity> {
    entities
        .into_iter()
        .map(|entity| (R::entity_key(&entity), entity))
        .collect()
}
