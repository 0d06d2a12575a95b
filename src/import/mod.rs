//! Bulk import pipeline.
//!
//! One call runs three strictly sequential stages:
//!
//! 1. **Extend catalog**: create every reference entry the batch names but
//!    the catalog lacks, persisted in one save. Failure aborts the call.
//! 2. **Process rows**: in input order, reject duplicates and incomplete
//!    rows, resolve references, and stage creates, updates and
//!    associations against the snapshots loaded at call start.
//! 3. **Commit**: creates and updates in one save, then associations in
//!    a second save.
//!
//! # Partial success
//!
//! - Rejected rows never block the other rows; they show up in
//!   `ImportResult::errors`.
//! - Catalog entries created in stage 1 stay persisted even if a later
//!   stage fails.
//! - If the association save fails, creates and updates remain committed
//!   and the call returns an `AssociationCommit` phase error.
//!
//! Snapshots are never refreshed during a call. A concurrent writer that
//! races this call is caught by the store's unique indexes at save time.

pub mod catalog;
pub mod codes;
pub mod commit;
pub mod context;
pub mod employee;
pub mod extend;
pub mod linker;
pub mod report;
pub mod rows;
pub mod sim_card;

pub use catalog::{Catalog, normalize_name};
pub use codes::{CodeGenerator, DEFAULT_MAX_CODE_ATTEMPTS};
pub use context::BatchContext;
pub use extend::CatalogDemand;
pub use report::{ImportReport, ImportResult, RowError};
pub use rows::{ImportRow, RowRejection};

use crate::error::{ImportPhase, Result, ResultExt};
use crate::model::{EmployeeRow, MasterReferenceEntry, ReferenceKind, SimCardRow};
use crate::storage::{Gateway, Record};
use chrono::{DateTime, Utc};

pub const DEFAULT_PARENT_NAME: &str = "General";

/// Options for one import call.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Recorded as `created_by` / `updated_by`.
    pub actor: String,
    /// Parent used for new child entries when the batch suggests none.
    pub default_parent: String,
    /// Upper bound on code generation attempts per entry.
    pub max_code_attempts: u32,
    pub project_code_prefix: String,
    pub cost_center_code_prefix: String,
    /// Run every stage but persist nothing.
    pub dry_run: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            actor: "system".to_string(),
            default_parent: DEFAULT_PARENT_NAME.to_string(),
            max_code_attempts: DEFAULT_MAX_CODE_ATTEMPTS,
            project_code_prefix: ReferenceKind::Project
                .code_prefix()
                .unwrap_or_default()
                .to_string(),
            cost_center_code_prefix: ReferenceKind::CostCenter
                .code_prefix()
                .unwrap_or_default()
                .to_string(),
            dry_run: false,
        }
    }
}

impl ImportOptions {
    /// Code prefix for kinds that require a code, `None` otherwise.
    #[must_use]
    pub fn code_prefix(&self, kind: ReferenceKind) -> Option<&str> {
        match kind {
            ReferenceKind::Project => Some(self.project_code_prefix.as_str()),
            ReferenceKind::CostCenter => Some(self.cost_center_code_prefix.as_str()),
            _ => None,
        }
    }
}

/// Runs import calls against a gateway.
pub struct Importer<'g, G: Gateway> {
    gateway: &'g mut G,
    options: ImportOptions,
}

impl<'g, G: Gateway> Importer<'g, G> {
    pub const fn new(gateway: &'g mut G, options: ImportOptions) -> Self {
        Self { gateway, options }
    }

    /// Run one import call with the current time as the call timestamp.
    ///
    /// # Errors
    ///
    /// Returns a phase-tagged error if a snapshot cannot be loaded, catalog
    /// extension fails, or a commit phase fails. Row-level problems are not
    /// errors; they are reported in the returned `ImportResult`.
    pub fn run<R: ImportRow>(&mut self, rows: &[R]) -> Result<ImportResult> {
        self.run_at(rows, Utc::now())
    }

    /// Run one import call with an explicit call timestamp.
    ///
    /// # Errors
    ///
    /// See [`Importer::run`].
    pub fn run_at<R: ImportRow>(&mut self, rows: &[R], now: DateTime<Utc>) -> Result<ImportResult> {
        tracing::info!(
            rows = rows.len(),
            table = <R::Entity as Record>::TABLE,
            actor = %self.options.actor,
            dry_run = self.options.dry_run,
            "Starting import"
        );

        // Snapshots
        let entries = self
            .gateway
            .load_all::<MasterReferenceEntry>()
            .in_phase(ImportPhase::Snapshot)?;
        let persisted = self
            .gateway
            .load_all::<R::Entity>()
            .in_phase(ImportPhase::Snapshot)?;
        let mut ctx = BatchContext::new(self.options.clone(), Catalog::new(entries), now);
        ctx.reserve_ids(persisted.iter().map(Record::id));
        let mut lookups =
            R::load_lookups(&*self.gateway, &mut ctx).in_phase(ImportPhase::Snapshot)?;
        let existing = rows::index_by_key::<R>(persisted);

        // Stage 1
        let demand = CatalogDemand::from_rows(rows);
        let extended = extend::extend_catalog(&mut *self.gateway, &mut ctx, &demand)?;

        // Stage 2
        let mut report = ImportReport::default();
        let staged = rows::process_rows(&mut ctx, rows, &existing, &mut lookups, &mut report);

        // Stage 3
        let summary = commit::commit(&mut *self.gateway, &staged, self.options.dry_run)?;
        report.record_commit(summary.created, summary.updated);

        tracing::info!(
            catalog_created = extended.len(),
            created = summary.created,
            updated = summary.updated,
            associations = summary.associations,
            rejected = report.error_count(),
            "Import finished"
        );
        Ok(report.finish())
    }
}

/// Import employee rows.
///
/// # Errors
///
/// See [`Importer::run`].
pub fn import_employees<G: Gateway>(
    gateway: &mut G,
    rows: &[EmployeeRow],
    options: ImportOptions,
) -> Result<ImportResult> {
    Importer::new(gateway, options).run(rows)
}

/// Import SIM card rows.
///
/// # Errors
///
/// See [`Importer::run`].
pub fn import_sim_cards<G: Gateway>(
    gateway: &mut G,
    rows: &[SimCardRow],
    options: ImportOptions,
) -> Result<ImportResult> {
    Importer::new(gateway, options).run(rows)
}
