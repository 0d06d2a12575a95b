//! Reference catalog resolver.
//!
//! Resolves free-text names to typed reference ids against an in-memory
//! snapshot of the catalog. Names match trimmed and case-insensitively.

use crate::import::rows::RowRejection;
use crate::model::{Kind, MasterReferenceEntry, RefId, ReferenceKind};
use std::collections::HashMap;

/// Normalize a reference name for comparison: trimmed and lower-cased.
#[must_use]
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Normalized form of an optional raw value, `None` when blank.
#[must_use]
pub fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

/// In-memory snapshot of the reference catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<MasterReferenceEntry>,
    by_name: HashMap<(ReferenceKind, String), usize>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    #[must_use]
    pub fn new(entries: Vec<MasterReferenceEntry>) -> Self {
        let mut catalog = Self::default();
        for entry in entries {
            catalog.insert(entry);
        }
        catalog
    }

    /// Add an entry. An entry whose id or `(kind, normalized_name)` is
    /// already present is ignored and `false` is returned.
    pub fn insert(&mut self, entry: MasterReferenceEntry) -> bool {
        let key = (entry.kind, entry.normalized_name.clone());
        if self.by_name.contains_key(&key) || self.by_id.contains_key(&entry.id) {
            return false;
        }
        let idx = self.entries.len();
        self.by_name.insert(key, idx);
        self.by_id.insert(entry.id.clone(), idx);
        self.entries.push(entry);
        true
    }

    /// Find the entry of `kind` whose normalized name matches `raw`.
    #[must_use]
    pub fn lookup(&self, kind: ReferenceKind, raw: &str) -> Option<&MasterReferenceEntry> {
        self.by_name
            .get(&(kind, normalize_name(raw)))
            .map(|&idx| &self.entries[idx])
    }

    /// Resolve a name to a typed id.
    #[must_use]
    pub fn resolve<K: Kind>(&self, raw: &str) -> Option<RefId<K>> {
        self.lookup(K::KIND, raw).map(|entry| RefId::new(entry.id.clone()))
    }

    /// Resolve an optional row field.
    ///
    /// Blank or missing input means "no reference" and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `RowRejection::ReferenceNotFound` when a non-blank name has no
    /// entry of kind `K`.
    pub fn resolve_optional<K: Kind>(
        &self,
        raw: Option<&str>,
    ) -> Result<Option<RefId<K>>, RowRejection> {
        let Some(name) = non_blank(raw) else {
            return Ok(None);
        };
        self.resolve::<K>(name)
            .map(Some)
            .ok_or_else(|| RowRejection::ReferenceNotFound {
                kind: K::KIND.label(),
                name: name.to_string(),
            })
    }

    /// Validate an explicit id against the entries of kind `K`.
    #[must_use]
    pub fn typed_id<K: Kind>(&self, id: &str) -> Option<RefId<K>> {
        self.by_id
            .get(id.trim())
            .map(|&idx| &self.entries[idx])
            .filter(|entry| entry.kind == K::KIND)
            .map(|entry| RefId::new(entry.id.clone()))
    }

    /// All codes currently in use, across kinds.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| entry.code.as_deref())
    }

    /// All entry ids.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.id.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
