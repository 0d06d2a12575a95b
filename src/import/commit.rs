//! Staged upsert commit.
//!
//! Phase 1 (creates) and phase 2 (updates) share one save unit. Phase 3
//! (associations) is a separate, later save: if it fails, phases 1 and 2
//! stay committed and the failure is reported as an `AssociationCommit`
//! phase error.

use crate::error::{ImportPhase, Result, ResultExt};
use crate::import::rows::StagedBatch;
use crate::storage::{Gateway, Record};

/// Counts of what a commit wrote (or would have written, in a dry run).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub created: usize,
    pub updated: usize,
    pub associations: usize,
}

/// Persist a staged batch.
///
/// # Errors
///
/// Returns an `EntityCommit` phase error if phases 1-2 fail (nothing from
/// this commit is persisted), or an `AssociationCommit` phase error if
/// phase 3 fails (creates and updates are already persisted).
pub fn commit<G: Gateway, E: Record, A: Record>(
    gateway: &mut G,
    batch: &StagedBatch<E, A>,
    dry_run: bool,
) -> Result<CommitSummary> {
    let summary = CommitSummary {
        created: batch.creates.len(),
        updated: batch.updates.len(),
        associations: batch.associations.len(),
    };

    if !batch.creates.is_empty() || !batch.updates.is_empty() {
        gateway.add_range(&batch.creates);
        gateway.update_range(&batch.updates);
        flush(gateway, dry_run).in_phase(ImportPhase::EntityCommit)?;
        tracing::info!(
            created = summary.created,
            updated = summary.updated,
            dry_run,
            "Committed entities"
        );
    }

    if !batch.associations.is_empty() {
        gateway.add_range(&batch.associations);
        if let Err(err) = flush(gateway, dry_run) {
            tracing::warn!(
                created = summary.created,
                updated = summary.updated,
                error = %err,
                "Association commit failed after entities were committed"
            );
            return Err(err.in_phase(ImportPhase::AssociationCommit));
        }
        tracing::info!(associations = summary.associations, dry_run, "Committed associations");
    }

    Ok(summary)
}

fn flush<G: Gateway>(gateway: &mut G, dry_run: bool) -> Result<()> {
    if dry_run {
        gateway.discard_changes();
    } else {
        gateway.save_changes()?;
    }
    Ok(())
}
