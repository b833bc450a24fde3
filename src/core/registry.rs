//=========================================================================
// Object Registry
//=========================================================================
//
// Identity table and deferred-destroy queue for scene objects.
//
// The registry owns nothing but ids: objects themselves live in the
// scene's containment tables, and every reference held here is a
// non-owning id that may have gone dead. Destruction is always deferred:
// `mark_pending_destroy` only records an execution time, and finalization
// happens when the coordinator drains `take_due`.
//
// Architecture:
//   ObjectRegistry
//     ├─ live:    BTreeSet<ObjectId>          (id order = creation order)
//     ├─ pending: HashSet<ObjectId>           (destroy already requested)
//     └─ queue:   BinaryHeap<Reverse<PendingDestroy>>  (min by execute_at)
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap, HashSet};

use log::debug;

//=== Object Id ===========================================================

/// Unique, monotonically allocated object identity.
///
/// Ids are never reused within a registry, so a dangling id is always
/// detectable: an allocated id that is no longer live has been destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub(crate) u64);

//=== PendingDestroy ======================================================

/// A deferred destruction: target id plus the scaled-clock time at which
/// it becomes due.
#[derive(Debug, Clone, Copy)]
struct PendingDestroy {
    execute_at: f64,
    /// Tie-breaker preserving request order among equal timestamps.
    seq: u64,
    target: ObjectId,
}

impl PartialEq for PendingDestroy {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PendingDestroy {}

impl PartialOrd for PendingDestroy {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingDestroy {
    fn cmp(&self, other: &Self) -> Ordering {
        self.execute_at
            .total_cmp(&other.execute_at)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

//=== ObjectRegistry ======================================================

/// Process-wide identity table and deferred-destroy queue.
///
/// Owned by a [`Scene`](crate::core::scene::Scene); there is no global
/// instance, so independent scenes (and parallel tests) never share state.
pub struct ObjectRegistry {
    next_id: u64,
    live: BTreeSet<ObjectId>,
    pending: HashSet<ObjectId>,
    queue: BinaryHeap<Reverse<PendingDestroy>>,
    next_seq: u64,
}

impl ObjectRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            next_id: 0,
            live: BTreeSet::new(),
            pending: HashSet::new(),
            queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    //--- Identity ---------------------------------------------------------

    /// Allocates the next id and records it as live.
    pub fn register(&mut self) -> ObjectId {
        self.next_id += 1;
        let id = ObjectId(self.next_id);
        self.live.insert(id);
        id
    }

    /// Removes an id from the live table. Idempotent.
    pub fn unregister(&mut self, id: ObjectId) {
        self.live.remove(&id);
        self.pending.remove(&id);
    }

    /// Whether the id is present in the live table.
    pub fn is_live(&self, id: ObjectId) -> bool {
        self.live.contains(&id)
    }

    /// Whether the id was allocated by this registry and has since been
    /// finalized.
    pub fn is_destroyed(&self, id: ObjectId) -> bool {
        id.0 >= 1 && id.0 <= self.next_id && !self.live.contains(&id)
    }

    /// Whether a destroy request is queued for the id.
    pub fn pending_destruction(&self, id: ObjectId) -> bool {
        self.pending.contains(&id)
    }

    /// Number of live ids.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Live ids in creation order.
    pub fn live_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.live.iter().copied()
    }

    //--- Deferred Destruction ---------------------------------------------

    /// Queues the id for destruction at `execute_at`.
    ///
    /// Returns false (and changes nothing) if the id is dead or already
    /// pending; repeated destroy requests are absorbed, so the first
    /// request's time stands even when a later request asks for sooner.
    pub fn mark_pending_destroy(&mut self, id: ObjectId, execute_at: f64) -> bool {
        if !self.live.contains(&id) {
            debug!("destroy request for dead object {:?} ignored", id);
            return false;
        }
        if !self.pending.insert(id) {
            debug!("object {:?} is already pending destruction", id);
            return false;
        }

        self.next_seq += 1;
        self.queue.push(Reverse(PendingDestroy {
            execute_at,
            seq: self.next_seq,
            target: id,
        }));
        true
    }

    /// Pops every entry due at `now` into a stable snapshot, ordered by
    /// `(execute_at, request order)`.
    ///
    /// Destroy requests issued while the caller processes the snapshot
    /// stay in the heap for a later call, even if they are already due,
    /// so a teardown hook can never corrupt the pass that is running it.
    ///
    /// The snapshot may contain ids that died since the request was made
    /// (e.g. finalized as part of an ancestor's subtree); callers are
    /// expected to skip those.
    pub fn take_due(&mut self, now: f64) -> Vec<ObjectId> {
        let mut due = Vec::new();
        while let Some(Reverse(head)) = self.queue.peek() {
            if head.execute_at > now {
                break;
            }
            let Some(Reverse(entry)) = self.queue.pop() else {
                break;
            };
            self.pending.remove(&entry.target);
            due.push(entry.target);
        }
        due
    }
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
