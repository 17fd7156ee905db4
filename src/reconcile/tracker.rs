use std::collections::BTreeSet;

use crate::models::CandidateIndex;

/// Which candidates of the current response were already committed.
///
/// Indices are only meaningful relative to one response, so the tracker is
/// reset as soon as a new query starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptanceTracker {
    accepted: BTreeSet<CandidateIndex>,
}

impl AcceptanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the index was not accepted before.
    pub fn mark_accepted(&mut self, index: CandidateIndex) -> bool {
        self.accepted.insert(index)
    }

    pub fn is_accepted(&self, index: CandidateIndex) -> bool {
        self.accepted.contains(&index)
    }

    pub fn all_accepted(&self, total: usize) -> bool {
        self.accepted.len() == total
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    /// Indices in `0..total` not yet accepted, ascending.
    pub fn pending(&self, total: usize) -> Vec<CandidateIndex> {
        (0..total).filter(|i| !self.accepted.contains(i)).collect()
    }

    /// Accept every pending index of `0..total` in one step and return them.
    pub fn mark_all(&mut self, total: usize) -> Vec<CandidateIndex> {
        let pending = self.pending(total);
        self.accepted.extend(pending.iter().copied());
        pending
    }

    pub fn reset(&mut self) {
        self.accepted.clear();
    }
}
