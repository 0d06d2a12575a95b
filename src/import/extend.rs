//! Catalog extension.
//!
//! Before any row is processed, every reference name used anywhere in the
//! batch that the catalog does not know yet gets exactly one new entry.
//! All new entries are persisted in a single save. Any failure here aborts
//! the whole call.

use crate::error::{ImportPhase, Result, ResultExt};
use crate::import::catalog::{non_blank, normalize_name};
use crate::import::context::BatchContext;
use crate::import::linker::ParentLinker;
use crate::import::rows::ImportRow;
use crate::model::{MasterReferenceEntry, ReferenceKind, ReferenceStatus};
use crate::storage::Gateway;
use std::collections::HashSet;

pub const AUTO_CREATED_DESCRIPTION: &str = "Auto-created during import";

#[derive(Debug, Clone)]
struct DemandedName {
    kind: ReferenceKind,
    normalized: String,
    display: String,
}

/// Reference names requested by a batch, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct CatalogDemand {
    names: Vec<DemandedName>,
    seen: HashSet<(ReferenceKind, String)>,
    linker: ParentLinker,
}

impl CatalogDemand {
    /// Collect the demand of every row.
    pub fn from_rows<R: ImportRow>(rows: &[R]) -> Self {
        let mut demand = Self::default();
        for row in rows {
            row.declare_references(&mut demand);
        }
        demand
    }

    /// Request a name. Blank names are ignored; the first spelling wins.
    pub fn name(&mut self, kind: ReferenceKind, raw: Option<&str>) {
        let Some(display) = non_blank(raw) else {
            return;
        };
        let normalized = normalize_name(display);
        if self.seen.insert((kind, normalized.clone())) {
            self.names.push(DemandedName {
                kind,
                normalized,
                display: display.to_string(),
            });
        }
    }

    /// Request a child name together with the parent this row pairs it with.
    pub fn child(&mut self, kind: ReferenceKind, child: Option<&str>, parent: Option<&str>) {
        self.name(kind, child);
        self.linker.observe(kind, child, parent);
    }

    /// Number of distinct names requested.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Create and persist catalog entries for every demanded name not in the
/// catalog. Returns the entries created, parents before children.
///
/// In dry-run mode the entries are added to the in-memory catalog only.
///
/// # Errors
///
/// Returns a `CatalogExtension` phase error if code generation is
/// exhausted or the gateway save fails.
pub fn extend_catalog<G: Gateway>(
    gateway: &mut G,
    ctx: &mut BatchContext,
    demand: &CatalogDemand,
) -> Result<Vec<MasterReferenceEntry>> {
    let created = stage_missing(ctx, demand).in_phase(ImportPhase::CatalogExtension)?;
    if created.is_empty() {
        return Ok(created);
    }

    gateway.add_range(&created);
    if ctx.options.dry_run {
        gateway.discard_changes();
        tracing::info!(count = created.len(), "Dry run: catalog entries not persisted");
    } else {
        gateway
            .save_changes()
            .in_phase(ImportPhase::CatalogExtension)?;
        tracing::info!(count = created.len(), "Catalog extended");
    }

    Ok(created)
}

fn stage_missing(
    ctx: &mut BatchContext,
    demand: &CatalogDemand,
) -> Result<Vec<MasterReferenceEntry>> {
    let mut created = Vec::new();

    for kind in ReferenceKind::ALL {
        let missing: Vec<&DemandedName> = demand
            .names
            .iter()
            .filter(|name| name.kind == kind)
            .filter(|name| ctx.catalog.lookup(kind, &name.normalized).is_none())
            .collect();

        for name in missing {
            let parent_id = match kind.parent() {
                Some(parent_kind) => Some(infer_parent(
                    ctx,
                    &demand.linker,
                    kind,
                    parent_kind,
                    &name.display,
                    &mut created,
                )?),
                None => None,
            };
            let entry = new_entry(ctx, kind, &name.display, parent_id)?;
            tracing::debug!(%kind, name = %entry.name, id = %entry.id, "Creating reference entry");
            ctx.catalog.insert(entry.clone());
            created.push(entry);
        }
    }

    Ok(created)
}

/// Pick the parent id for a new child entry.
///
/// The majority parent from the batch is used when it resolves; otherwise
/// the configured default parent, created on first need.
fn infer_parent(
    ctx: &mut BatchContext,
    linker: &ParentLinker,
    kind: ReferenceKind,
    parent_kind: ReferenceKind,
    child: &str,
    created: &mut Vec<MasterReferenceEntry>,
) -> Result<String> {
    if let Some(parent) = linker
        .winner(kind, child)
        .and_then(|winner| ctx.catalog.lookup(parent_kind, winner))
    {
        return Ok(parent.id.clone());
    }

    let default_name = ctx.options.default_parent.clone();
    if let Some(existing) = ctx.catalog.lookup(parent_kind, &default_name) {
        return Ok(existing.id.clone());
    }

    let entry = new_entry(ctx, parent_kind, &default_name, None)?;
    tracing::info!(kind = %parent_kind, name = %entry.name, "Creating default parent");
    let id = entry.id.clone();
    ctx.catalog.insert(entry.clone());
    created.push(entry);
    Ok(id)
}

fn new_entry(
    ctx: &mut BatchContext,
    kind: ReferenceKind,
    display: &str,
    parent_id: Option<String>,
) -> Result<MasterReferenceEntry> {
    let normalized_name = normalize_name(display);
    let code = match ctx.options.code_prefix(kind).map(str::to_string) {
        Some(prefix) => Some(ctx.codes.generate(kind, &prefix, ctx.now)?),
        None => None,
    };
    let id = ctx.mint_id("ref", &format!("{kind}:{normalized_name}"));

    Ok(MasterReferenceEntry {
        id,
        kind,
        code,
        name: display.trim().to_string(),
        normalized_name,
        parent_id,
        description: Some(AUTO_CREATED_DESCRIPTION.to_string()),
        status: ReferenceStatus::Active,
        created_at: ctx.now,
        created_by: ctx.actor().to_string(),
    })
}
