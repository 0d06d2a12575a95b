//! Per-call state threaded through every pipeline stage.

use crate::import::ImportOptions;
use crate::import::catalog::Catalog;
use crate::import::codes::CodeGenerator;
use crate::util::IdGenerator;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Everything one import call knows.
///
/// Built once from the snapshots loaded at call start. The catalog grows
/// only during catalog extension and is read-only afterwards.
#[derive(Debug)]
pub struct BatchContext {
    pub options: ImportOptions,
    /// Timestamp stamped on every record created or updated by this call.
    pub now: DateTime<Utc>,
    pub catalog: Catalog,
    pub codes: CodeGenerator,
    ids: IdGenerator,
    taken_ids: HashSet<String>,
}

impl BatchContext {
    #[must_use]
    pub fn new(options: ImportOptions, catalog: Catalog, now: DateTime<Utc>) -> Self {
        let codes = CodeGenerator::new(options.max_code_attempts, catalog.codes());
        let taken_ids = catalog.ids().map(str::to_string).collect();
        Self {
            options,
            now,
            catalog,
            codes,
            ids: IdGenerator::default(),
            taken_ids,
        }
    }

    #[must_use]
    pub fn actor(&self) -> &str {
        &self.options.actor
    }

    /// Mark ids loaded from other snapshots as taken.
    pub fn reserve_ids<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.taken_ids.extend(ids.into_iter().map(str::to_string));
    }

    /// Mint a fresh record id that collides with nothing seen by this call.
    pub fn mint_id(&mut self, prefix: &str, natural_key: &str) -> String {
        let taken = &self.taken_ids;
        let id = self.ids.generate(
            prefix,
            natural_key,
            &self.options.actor,
            self.now,
            taken.len(),
            |candidate| taken.contains(candidate),
        );
        self.taken_ids.insert(id.clone());
        id
    }
}
