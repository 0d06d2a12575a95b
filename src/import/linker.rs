//! Heuristic parent inference for hierarchical reference kinds.
//!
//! Every row that names both a child and a parent casts one vote for that
//! pairing. The winning parent for a child is the one with the most votes;
//! ties go to the parent first seen in the batch.

use crate::import::catalog::{non_blank, normalize_name};
use crate::model::ReferenceKind;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Candidate {
    display: String,
    votes: usize,
    first_seen: usize,
}

/// Vote tally of parent names per child name.
#[derive(Debug, Clone, Default)]
pub struct ParentLinker {
    tallies: HashMap<(ReferenceKind, String), HashMap<String, Candidate>>,
    sequence: usize,
}

impl ParentLinker {
    /// Record one row's pairing of a child with its (possibly blank) parent.
    ///
    /// Blank children and blank parents are ignored.
    pub fn observe(&mut self, child_kind: ReferenceKind, child: Option<&str>, parent: Option<&str>) {
        let (Some(child), Some(parent)) = (non_blank(child), non_blank(parent)) else {
            return;
        };
        let seq = self.sequence;
        self.sequence += 1;

        let candidate = self
            .tallies
            .entry((child_kind, normalize_name(child)))
            .or_default()
            .entry(normalize_name(parent))
            .or_insert_with(|| Candidate {
                display: parent.to_string(),
                votes: 0,
                first_seen: seq,
            });
        candidate.votes += 1;
    }

    /// The winning parent name for a child, as first spelled in the batch.
    ///
    /// `None` when no row supplied a parent for this child.
    #[must_use]
    pub fn winner(&self, child_kind: ReferenceKind, child: &str) -> Option<&str> {
        self.tallies
            .get(&(child_kind, normalize_name(child)))?
            .values()
            .max_by(|a, b| {
                a.votes
                    .cmp(&b.votes)
                    .then_with(|| b.first_seen.cmp(&a.first_seen))
            })
            .map(|candidate| candidate.display.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUB: ReferenceKind = ReferenceKind::SubDepartment;

    #[test]
    fn test_majority_wins() {
        let mut linker = ParentLinker::default();
        linker.observe(SUB, Some("X"), Some("A"));
        linker.observe(SUB, Some("X"), Some("A"));
        linker.observe(SUB, Some("X"), Some("B"));
        assert_eq!(linker.winner(SUB, "x"), Some("A"));
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let mut linker = ParentLinker::default();
        linker.observe(SUB, Some("X"), Some("Beta"));
        linker.observe(SUB, Some("X"), Some("Alpha"));
        linker.observe(SUB, Some("X"), Some("alpha"));
        linker.observe(SUB, Some("X"), Some("BETA"));
        assert_eq!(linker.winner(SUB, "X"), Some("Beta"));
    }

    #[test]
    fn test_votes_merge_across_spellings() {
        let mut linker = ParentLinker::default();
        linker.observe(SUB, Some("Payroll"), Some("Finance"));
        linker.observe(SUB, Some(" payroll "), Some(" FINANCE"));
        linker.observe(SUB, Some("PAYROLL"), Some("Operations"));
        assert_eq!(linker.winner(SUB, "Payroll"), Some("Finance"));
    }

    #[test]
    fn test_blank_parent_casts_no_vote() {
        let mut linker = ParentLinker::default();
        linker.observe(SUB, Some("X"), Some("  "));
        linker.observe(SUB, Some("X"), None);
        linker.observe(SUB, None, Some("A"));
        assert_eq!(linker.winner(SUB, "X"), None);
    }
}
