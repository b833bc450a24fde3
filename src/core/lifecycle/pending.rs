//=========================================================================
// Pending Lifecycle Set
//=========================================================================
//
// De-duplicated, insertion-ordered batch of behaviours awaiting their
// Awake/OnEnable/Start pass.
//
// The coordinator snapshots-and-clears the set at each drain, so
// re-entrant insertions made by callbacks land in a fresh batch for the
// next drain instead of extending the one being processed.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashSet;

//=== Internal Dependencies ===============================================

use crate::core::scene::BehaviourId;

//=== PendingSet ==========================================================

/// Insertion-ordered set of behaviours queued for lifecycle processing.
///
/// Queueing the same behaviour twice before a drain processes it exactly
/// once; relative order across behaviours follows first insertion, which
/// is deterministic and safe to assert on in tests.
pub struct PendingSet {
    order: Vec<BehaviourId>,
    members: HashSet<BehaviourId>,
}

impl PendingSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            members: HashSet::new(),
        }
    }

    /// Adds a behaviour to the batch. Idempotent; returns whether the
    /// behaviour was newly added.
    pub fn insert(&mut self, id: BehaviourId) -> bool {
        if !self.members.insert(id) {
            return false;
        }
        self.order.push(id);
        true
    }

    /// Whether the behaviour is queued.
    pub fn contains(&self, id: BehaviourId) -> bool {
        self.members.contains(&id)
    }

    /// Number of queued behaviours.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Takes the whole batch in insertion order, leaving the set empty.
    ///
    /// Insertions made while the caller iterates the snapshot accumulate
    /// for the next take.
    pub fn take(&mut self) -> Vec<BehaviourId> {
        self.members.clear();
        std::mem::take(&mut self.order)
    }
}

impl Default for PendingSet {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> BehaviourId {
        BehaviourId(raw)
    }

    #[test]
    fn insert_deduplicates() {
        let mut set = PendingSet::new();
        assert!(set.insert(id(1)));
        assert!(!set.insert(id(1)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn take_preserves_insertion_order() {
        let mut set = PendingSet::new();
        set.insert(id(3));
        set.insert(id(1));
        set.insert(id(2));
        set.insert(id(1));
        assert_eq!(set.take(), vec![id(3), id(1), id(2)]);
    }

    #[test]
    fn take_clears_the_set() {
        let mut set = PendingSet::new();
        set.insert(id(7));
        set.take();
        assert!(set.is_empty());
        assert!(!set.contains(id(7)));
        // Re-inserting after a take works; the dedup state was cleared too.
        assert!(set.insert(id(7)));
    }

    #[test]
    fn insertions_after_take_form_a_fresh_batch() {
        let mut set = PendingSet::new();
        set.insert(id(1));
        let batch = set.take();
        set.insert(id(2));
        assert_eq!(batch, vec![id(1)]);
        assert_eq!(set.take(), vec![id(2)]);
    }
}
